//! Cart line assembly: products, choice groups and option selection.
//!
//! A cart line is valid when every group with `min > 0` has at least `min`
//! options selected. Groups with `max <= 1` are single-select; larger groups
//! accept additions up to `max` and ignore the rest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{Money, OrderItem};

/// A selectable option inside a choice group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: Money,
}

/// A group of options with selection bounds (e.g. "Ponto da carne", min 1, max 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub min: u32,
    #[serde(default = "default_max")]
    pub max: u32,
    pub options: Vec<ChoiceOption>,
}

fn default_max() -> u32 {
    1
}

impl ChoiceGroup {
    pub fn is_single_select(&self) -> bool {
        self.max <= 1
    }

    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A catalog product as offered to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub promotional_price: Option<Money>,
    #[serde(default)]
    pub choice_groups: Vec<ChoiceGroup>,
}

impl Product {
    /// Price charged per unit before options.
    pub fn effective_price(&self) -> Money {
        self.promotional_price.unwrap_or(self.price)
    }

    pub fn group(&self, group_id: &str) -> Option<&ChoiceGroup> {
        self.choice_groups.iter().find(|g| g.id == group_id)
    }
}

/// Result of selecting an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Added,
    /// Single-select group: the previous option was swapped out.
    Replaced { previous: String },
    /// Multi-select group already holds `max` options; nothing changed.
    AtLimit,
    AlreadySelected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Unknown choice group '{group_id}' for product '{product_id}'")]
    UnknownGroup {
        product_id: String,
        group_id: String,
    },

    #[error("Unknown option '{option_id}' in group '{group_id}'")]
    UnknownOption { group_id: String, option_id: String },

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Required choices missing: {}", groups.join(", "))]
    MissingChoices { groups: Vec<String> },

    #[error("Cart line {0} does not exist")]
    NoSuchLine(usize),
}

/// One product in the cart with its selected options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    /// Selected option ids per group id, in selection order.
    #[serde(default)]
    pub selections: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CartLine {
    pub fn new(product: Product, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        Ok(Self {
            product,
            quantity,
            selections: BTreeMap::new(),
            notes: None,
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Selects an option, honouring the group's single/multi-select rule.
    pub fn select(&mut self, group_id: &str, option_id: &str) -> Result<SelectOutcome, CartError> {
        let group = self
            .product
            .group(group_id)
            .ok_or_else(|| CartError::UnknownGroup {
                product_id: self.product.id.clone(),
                group_id: group_id.to_string(),
            })?;
        if group.option(option_id).is_none() {
            return Err(CartError::UnknownOption {
                group_id: group_id.to_string(),
                option_id: option_id.to_string(),
            });
        }
        let single = group.is_single_select();
        let max = group.max as usize;

        let selected = self.selections.entry(group_id.to_string()).or_default();
        if selected.iter().any(|id| id == option_id) {
            return Ok(SelectOutcome::AlreadySelected);
        }

        if single {
            let previous = selected.pop();
            selected.clear();
            selected.push(option_id.to_string());
            return Ok(match previous {
                Some(previous) => SelectOutcome::Replaced { previous },
                None => SelectOutcome::Added,
            });
        }

        if selected.len() >= max {
            return Ok(SelectOutcome::AtLimit);
        }
        selected.push(option_id.to_string());
        Ok(SelectOutcome::Added)
    }

    /// Removes an option. Returns false if it was not selected.
    pub fn deselect(&mut self, group_id: &str, option_id: &str) -> bool {
        let Some(selected) = self.selections.get_mut(group_id) else {
            return false;
        };
        let before = selected.len();
        selected.retain(|id| id != option_id);
        let removed = selected.len() != before;
        if selected.is_empty() {
            self.selections.remove(group_id);
        }
        removed
    }

    /// Number of options selected in a group.
    pub fn selected_count(&self, group_id: &str) -> usize {
        self.selections.get(group_id).map_or(0, Vec::len)
    }

    /// Groups whose minimum is not met yet.
    pub fn missing_groups(&self) -> Vec<&ChoiceGroup> {
        self.product
            .choice_groups
            .iter()
            .filter(|g| g.min > 0 && self.selected_count(&g.id) < g.min as usize)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_groups().is_empty()
    }

    /// Selected options, in group order then selection order.
    pub fn selected_options(&self) -> Vec<&ChoiceOption> {
        self.product
            .choice_groups
            .iter()
            .flat_map(|group| {
                self.selections
                    .get(&group.id)
                    .into_iter()
                    .flatten()
                    .filter_map(move |id| group.option(id))
            })
            .collect()
    }

    /// Per-unit price: effective product price plus selected options.
    pub fn unit_price(&self) -> Money {
        self.product.effective_price() + self.selected_options().into_iter().map(|o| o.price).sum::<Money>()
    }

    /// `(promotional_price ?? price) * quantity + sum(option prices) * quantity`.
    pub fn total_price(&self) -> Money {
        self.unit_price().multiply(self.quantity)
    }

    /// Returns a copy to edit, starting from the current selections.
    pub fn reopen(&self) -> CartLine {
        self.clone()
    }

    /// Snapshots the line as an order item. Fails if required choices are missing.
    pub fn to_order_item(&self) -> Result<OrderItem, CartError> {
        let missing = self.missing_groups();
        if !missing.is_empty() {
            return Err(CartError::MissingChoices {
                groups: missing.iter().map(|g| g.name.clone()).collect(),
            });
        }

        let option_names: Vec<&str> = self
            .selected_options()
            .into_iter()
            .map(|o| o.name.as_str())
            .collect();
        let notes = [
            (!option_names.is_empty()).then(|| option_names.join(", ")),
            self.notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        let mut item = OrderItem::new(self.product.name.clone(), self.quantity, self.unit_price())
            .with_total_price(self.total_price());
        if !notes.is_empty() {
            item = item.with_notes(notes.join(" | "));
        }
        Ok(item)
    }
}

/// The set of lines being assembled into an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a line. Lines with unmet required choices are rejected.
    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        ensure_valid(&line)?;
        self.lines.push(line);
        Ok(())
    }

    /// Opens an existing line for editing with its selections preserved.
    pub fn edit(&self, index: usize) -> Result<CartLine, CartError> {
        self.lines
            .get(index)
            .map(CartLine::reopen)
            .ok_or(CartError::NoSuchLine(index))
    }

    /// Replaces a line after editing.
    pub fn replace(&mut self, index: usize, line: CartLine) -> Result<(), CartError> {
        ensure_valid(&line)?;
        let slot = self.lines.get_mut(index).ok_or(CartError::NoSuchLine(index))?;
        *slot = line;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::NoSuchLine(index));
        }
        Ok(self.lines.remove(index))
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::total_price).sum()
    }

    pub fn to_order_items(&self) -> Result<Vec<OrderItem>, CartError> {
        self.lines.iter().map(CartLine::to_order_item).collect()
    }
}

fn ensure_valid(line: &CartLine) -> Result<(), CartError> {
    let missing = line.missing_groups();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CartError::MissingChoices {
            groups: missing.iter().map(|g| g.name.clone()).collect(),
        })
    }
}
