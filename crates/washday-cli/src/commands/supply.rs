//! Supply inventory commands for CLI.

use clap::Subcommand;
use serde::Serialize;
use uuid::Uuid;
use washday_core::{Supply, SupplyQuery, SupplyType};

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum SupplyAction {
    /// Add a supply, full unless --remaining says otherwise
    Add {
        name: String,
        /// detergent, liquid-detergent, fabric-softener, stain-remover, bleach, pods, dryer-sheets
        #[arg(long = "type", default_value = "detergent")]
        supply_type: SupplyType,
        /// Remaining percent (0-100)
        #[arg(long)]
        remaining: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List supplies, emptiest first
    List {
        #[arg(long = "type")]
        supply_type: Option<SupplyType>,
        /// Match on name or type
        #[arg(long)]
        search: Option<String>,
    },
    /// Edit a supply
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        supply_type: Option<SupplyType>,
        #[arg(long)]
        remaining: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a supply
    Delete { id: Uuid },
    /// Use up some percent of a supply
    Use {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Supplies below 25%
    Low,
}

#[derive(Serialize)]
struct SupplyView {
    #[serde(flatten)]
    supply: Supply,
    is_low: bool,
}

impl From<Supply> for SupplyView {
    fn from(supply: Supply) -> Self {
        Self {
            is_low: supply.is_low(),
            supply,
        }
    }
}

fn views(supplies: Vec<Supply>) -> Vec<SupplyView> {
    supplies.into_iter().map(SupplyView::from).collect()
}

pub fn run(action: SupplyAction) -> CmdResult {
    let session = Session::open()?;
    let ctx = &session.ctx;

    match action {
        SupplyAction::Add {
            name,
            supply_type,
            remaining,
            notes,
        } => {
            let mut supply = Supply::new(name, supply_type, ctx.now());
            if let Some(remaining) = remaining {
                supply = supply.with_remaining(remaining);
            }
            if let Some(notes) = notes {
                supply = supply.with_notes(notes);
            }
            ctx.add_supply(supply.clone())?;
            print_json(&SupplyView::from(supply))?;
        }
        SupplyAction::List { supply_type, search } => {
            let query = SupplyQuery {
                supply_type,
                search,
            };
            print_json(&views(ctx.supplies(&query)))?;
        }
        SupplyAction::Update {
            id,
            name,
            supply_type,
            remaining,
            notes,
        } => {
            let mut supply = ctx
                .supply(id)
                .ok_or_else(|| format!("supply not found: {id}"))?;
            if let Some(name) = name {
                supply.name = name;
            }
            if let Some(supply_type) = supply_type {
                supply.supply_type = supply_type;
            }
            if let Some(remaining) = remaining {
                supply.set_remaining_percent(remaining);
            }
            if let Some(notes) = notes {
                supply.notes = notes;
            }
            if !ctx.update_supply(supply.clone())? {
                return Err(format!("supply not found: {id}").into());
            }
            print_json(&SupplyView::from(supply))?;
        }
        SupplyAction::Delete { id } => {
            if !ctx.delete_supply(id) {
                return Err(format!("supply not found: {id}").into());
            }
            println!("Supply deleted: {id}");
        }
        SupplyAction::Use { id, amount } => {
            ctx.consume_supply(id, amount)?
                .ok_or_else(|| format!("supply not found: {id}"))?;
            let supply = ctx
                .supply(id)
                .ok_or_else(|| format!("supply not found: {id}"))?;
            print_json(&SupplyView::from(supply))?;
        }
        SupplyAction::Low => {
            let mut low = ctx.low_supplies();
            low.sort_by(|a, b| a.remaining_percent().total_cmp(&b.remaining_percent()));
            print_json(&views(low))?;
        }
    }

    session.report_gateway_error();
    Ok(())
}
