use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::ShoppingListStatus;
use super::user::User;
use crate::error::{KitchenError, Result};
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: Option<i64>,
    pub ingredient_name: String,
    pub(crate) quantity: f64,
    pub unit: String,
    pub supplier: Option<String>,
    pub is_ordered: bool,
    pub notes: Option<String>,
    pub(crate) shopping_list_id: Option<i64>,
}

impl ShoppingListItem {
    pub fn new(ingredient_name: &str, quantity: f64, unit: &str) -> Result<Self> {
        Ok(Self {
            id: None,
            ingredient_name: validation::validate_not_blank(ingredient_name, "Ingredient name")?,
            quantity: validation::validate_quantity(quantity, "Quantity")?,
            unit: validation::validate_not_blank(unit, "Unit")?,
            supplier: None,
            is_ordered: false,
            notes: None,
            shopping_list_id: None,
        })
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: f64) -> Result<()> {
        self.quantity = validation::validate_quantity(quantity, "Quantity")?;
        Ok(())
    }

    pub fn shopping_list_id(&self) -> Option<i64> {
        self.shopping_list_id
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_not_blank(&self.ingredient_name, "Ingredient name")?;
        validation::validate_not_blank(&self.unit, "Unit")?;
        validation::validate_quantity(self.quantity, "Quantity")?;
        Ok(())
    }
}

/// What to order for one delivery date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Option<i64>,
    pub delivery_date: NaiveDate,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub(crate) status: ShoppingListStatus,
    pub(crate) finalized_at: Option<DateTime<Utc>>,
    pub(crate) items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn new(delivery_date: NaiveDate, creator: &User) -> Result<Self> {
        Ok(Self {
            id: None,
            delivery_date,
            created_by: validation::require_id(creator.id, "Creator")?,
            created_at: Utc::now(),
            status: ShoppingListStatus::Draft,
            finalized_at: None,
            items: Vec::new(),
        })
    }

    pub fn status(&self) -> ShoppingListStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status == ShoppingListStatus::Finalized
    }

    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn item_mut(&mut self, item_id: i64) -> Option<&mut ShoppingListItem> {
        self.items.iter_mut().find(|i| i.id == Some(item_id))
    }

    pub fn add_item(&mut self, mut item: ShoppingListItem) {
        item.shopping_list_id = self.id;
        self.items.push(item);
    }

    /// Detaches a persisted item. Saving the list afterwards deletes it.
    pub fn remove_item(&mut self, item_id: i64) -> Option<ShoppingListItem> {
        self.remove_item_where(|i| i.id == Some(item_id))
    }

    /// Detaches the first item matching `pred`, persisted or not.
    pub fn remove_item_where<F>(&mut self, pred: F) -> Option<ShoppingListItem>
    where
        F: FnMut(&ShoppingListItem) -> bool,
    {
        let index = self.items.iter().position(pred)?;
        let mut item = self.items.remove(index);
        item.shopping_list_id = None;
        Some(item)
    }

    /// Items still waiting to be ordered.
    pub fn outstanding(&self) -> impl Iterator<Item = &ShoppingListItem> {
        self.items.iter().filter(|i| !i.is_ordered)
    }

    /// DRAFT -> FINALIZED, once.
    pub fn finalize(&mut self) -> Result<()> {
        if self.status != ShoppingListStatus::Draft {
            return Err(KitchenError::illegal_state(
                "Only draft shopping lists can be finalized",
            ));
        }
        self.status = ShoppingListStatus::Finalized;
        self.finalized_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validation::validate_id(self.created_by)?;
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Delivery {} [{}]", self.delivery_date, self.status)?;
        for item in &self.items {
            let mark = if item.is_ordered { "x" } else { " " };
            write!(
                f,
                "  [{}] {} {} {}",
                mark, item.quantity, item.unit, item.ingredient_name
            )?;
            if let Some(supplier) = &item.supplier {
                write!(f, " ({})", supplier)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn creator() -> User {
        let mut user = User::new("Claire", "Smyth", "claire@pastry.com", "hash", Role::SousChef)
            .unwrap();
        user.id = Some(2);
        user
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_item_quantity_must_be_non_negative() {
        assert!(ShoppingListItem::new("Laks", 0.0, "sider").is_ok());
        assert!(matches!(
            ShoppingListItem::new("Laks", -1.0, "sider"),
            Err(KitchenError::InvalidArgument(_))
        ));

        let mut item = ShoppingListItem::new("Laks", 5.0, "sider").unwrap();
        assert!(item.set_quantity(-2.0).is_err());
        assert_eq!(item.quantity(), 5.0);
    }

    #[test]
    fn test_new_list_requires_persisted_creator() {
        let mut transient = creator();
        transient.id = None;
        assert!(ShoppingList::new(date(), &transient).is_err());
    }

    #[test]
    fn test_add_remove_item() {
        let mut list = ShoppingList::new(date(), &creator()).unwrap();
        list.id = Some(9);

        let mut item = ShoppingListItem::new("Frisk Dild", 15.0, "bundter")
            .unwrap()
            .with_supplier("Grønttorvet");
        item.id = Some(30);
        list.add_item(item);
        assert_eq!(list.items()[0].shopping_list_id(), Some(9));

        let removed = list.remove_item(30).unwrap();
        assert!(removed.shopping_list_id().is_none());
        assert!(list.items().is_empty());
    }

    #[test]
    fn test_remove_unsaved_item() {
        let mut list = ShoppingList::new(date(), &creator()).unwrap();
        list.add_item(ShoppingListItem::new("Laks", 5.0, "sider").unwrap());
        list.add_item(ShoppingListItem::new("Dild", 2.0, "bundter").unwrap());

        assert!(list.remove_item_where(|i| i.ingredient_name == "Ost").is_none());
        let removed = list
            .remove_item_where(|i| i.ingredient_name == "Laks")
            .unwrap();
        assert!(removed.id.is_none());
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].ingredient_name, "Dild");
    }

    #[test]
    fn test_finalize_once() {
        let mut list = ShoppingList::new(date(), &creator()).unwrap();
        list.finalize().unwrap();
        assert!(list.is_finalized());
        assert!(list.finalized_at().is_some());
        assert!(matches!(
            list.finalize(),
            Err(KitchenError::IllegalState(_))
        ));
    }

    #[test]
    fn test_outstanding_items() {
        let mut list = ShoppingList::new(date(), &creator()).unwrap();
        list.add_item(ShoppingListItem::new("Laks", 5.0, "sider").unwrap());
        let mut ordered = ShoppingListItem::new("Dild", 2.0, "bundter").unwrap();
        ordered.is_ordered = true;
        list.add_item(ordered);

        let outstanding: Vec<_> = list.outstanding().collect();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].ingredient_name, "Laks");
    }
}
