//! Wardrobe commands for CLI.

use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use uuid::Uuid;
use washday_core::{ClothingCategory, ClothingItem, ItemQuery, ItemSort};

use super::{print_json, CmdResult, Session};

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    /// Longest since last wash first
    LastWashed,
    Name,
    /// Most washed first
    WashCount,
}

impl From<SortArg> for ItemSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::LastWashed => ItemSort::LastWashed,
            SortArg::Name => ItemSort::Name,
            SortArg::WashCount => ItemSort::WashCount,
        }
    }
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add a garment
    Add {
        name: String,
        /// tops, bottoms, outerwear, underwear, sportswear, accessories, bedding, towels
        #[arg(long, default_value = "tops")]
        category: ClothingCategory,
        #[arg(long, default_value = "")]
        color: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List garments
    List {
        #[arg(long)]
        category: Option<ClothingCategory>,
        /// Match on name or category
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value = "last-washed")]
        sort: SortArg,
    },
    /// Show one garment
    Show { id: Uuid },
    /// Edit a garment
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<ClothingCategory>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a garment
    Delete { id: Uuid },
    /// Record that a garment was washed just now
    Wash { id: Uuid },
    /// Garments due for a wash
    Overdue {
        /// Days since last wash (default: wardrobe.needs_wash_after_days)
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Serialize)]
struct ItemView {
    #[serde(flatten)]
    item: ClothingItem,
    days_since_wash: Option<i64>,
}

pub fn run(action: ItemAction) -> CmdResult {
    let session = Session::open()?;
    let ctx = &session.ctx;
    let view = |item: ClothingItem| ItemView {
        days_since_wash: item.days_since_wash(ctx.now()),
        item,
    };

    match action {
        ItemAction::Add {
            name,
            category,
            color,
            notes,
        } => {
            let mut item = ClothingItem::new(name, category).with_color(color);
            if let Some(notes) = notes {
                item = item.with_notes(notes);
            }
            ctx.add_item(item.clone())?;
            print_json(&view(item))?;
        }
        ItemAction::List {
            category,
            search,
            sort,
        } => {
            let query = ItemQuery {
                category,
                search,
                sort: sort.into(),
            };
            let items: Vec<ItemView> = ctx.items(&query).into_iter().map(view).collect();
            print_json(&items)?;
        }
        ItemAction::Show { id } => {
            let item = ctx.item(id).ok_or_else(|| format!("item not found: {id}"))?;
            print_json(&view(item))?;
        }
        ItemAction::Update {
            id,
            name,
            category,
            color,
            notes,
        } => {
            let mut item = ctx.item(id).ok_or_else(|| format!("item not found: {id}"))?;
            if let Some(name) = name {
                item.name = name;
            }
            if let Some(category) = category {
                item.category = category;
                item.icon = category.icon().to_string();
            }
            if let Some(color) = color {
                item.color = color;
            }
            if let Some(notes) = notes {
                item.notes = notes;
            }
            if !ctx.update_item(item.clone())? {
                return Err(format!("item not found: {id}").into());
            }
            print_json(&view(item))?;
        }
        ItemAction::Delete { id } => {
            if !ctx.delete_item(id) {
                return Err(format!("item not found: {id}").into());
            }
            println!("Item deleted: {id}");
        }
        ItemAction::Wash { id } => {
            let item = ctx
                .mark_washed(id)
                .ok_or_else(|| format!("item not found: {id}"))?;
            print_json(&view(item))?;
        }
        ItemAction::Overdue { days } => {
            let days = days.unwrap_or(session.config.wardrobe.needs_wash_after_days);
            let items: Vec<ItemView> = ctx.needs_wash(days).into_iter().map(view).collect();
            print_json(&items)?;
        }
    }

    session.report_gateway_error();
    Ok(())
}
