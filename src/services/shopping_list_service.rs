use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{IngredientRequestRepository, ShoppingListRepository};
use crate::error::{KitchenError, Result};
use crate::models::{
    Action, ReviewStatus, ShoppingList, ShoppingListItem, ShoppingListStatus, User,
};

/// Input for [`ShoppingListService::add_item`].
#[derive(Debug, Clone, Default)]
pub struct NewShoppingListItem {
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

impl NewShoppingListItem {
    fn into_item(self) -> Result<ShoppingListItem> {
        let mut item = ShoppingListItem::new(&self.ingredient_name, self.quantity, &self.unit)?;
        item.supplier = self.supplier;
        item.notes = self.notes;
        Ok(item)
    }
}

pub struct ShoppingListService {
    lists: ShoppingListRepository,
    requests: IngredientRequestRepository,
}

impl ShoppingListService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            lists: ShoppingListRepository::new(pool.clone()),
            requests: IngredientRequestRepository::new(pool),
        }
    }

    pub async fn create_list(&self, actor: &User, delivery_date: NaiveDate) -> Result<ShoppingList> {
        authorize(actor)?;
        let list = self.lists.create(&ShoppingList::new(delivery_date, actor)?).await?;
        info!(shopping_list_id = ?list.id, delivery_date = %delivery_date, "shopping list created");
        Ok(list)
    }

    /// Builds a draft list for the date from every approved ingredient request
    /// due that day. Requests for the same ingredient, unit and supplier are
    /// merged into one line with the quantities summed.
    pub async fn generate_from_approved_requests(
        &self,
        actor: &User,
        delivery_date: NaiveDate,
    ) -> Result<ShoppingList> {
        authorize(actor)?;

        let requests = self
            .requests
            .find_by_status_and_delivery_date(ReviewStatus::Approved, delivery_date)
            .await?;

        let mut list = ShoppingList::new(delivery_date, actor)?;
        for request in &requests {
            let merged = list.items.iter_mut().find(|item| {
                item.ingredient_name.eq_ignore_ascii_case(request.name.trim())
                    && item.unit.eq_ignore_ascii_case(request.unit.trim())
                    && item.supplier == request.preferred_supplier
            });
            match merged {
                Some(item) => item.set_quantity(item.quantity() + request.quantity)?,
                None => {
                    let mut item = ShoppingListItem::new(&request.name, request.quantity, &request.unit)?;
                    item.supplier = request.preferred_supplier.clone();
                    item.notes = request.note.clone();
                    list.add_item(item);
                }
            }
        }

        let list = self.lists.create(&list).await?;
        info!(
            shopping_list_id = ?list.id,
            delivery_date = %delivery_date,
            requests = requests.len(),
            items = list.items().len(),
            "shopping list generated"
        );
        Ok(list)
    }

    pub async fn add_item(
        &self,
        actor: &User,
        list_id: i64,
        input: NewShoppingListItem,
    ) -> Result<ShoppingList> {
        authorize(actor)?;

        let mut list = self.draft_list(list_id).await?;
        let item = input.into_item()?;
        let name = item.ingredient_name.clone();
        list.add_item(item);

        let list = self.lists.update(&list).await?;
        info!(shopping_list_id = list_id, ingredient = %name, "shopping list item added");
        Ok(list)
    }

    pub async fn remove_item(&self, actor: &User, list_id: i64, item_id: i64) -> Result<ShoppingList> {
        authorize(actor)?;

        let mut list = self.draft_list(list_id).await?;
        list.remove_item(item_id)
            .ok_or_else(|| KitchenError::not_found("ShoppingListItem", item_id))?;

        let list = self.lists.update(&list).await?;
        info!(shopping_list_id = list_id, item_id, "shopping list item removed");
        Ok(list)
    }

    /// Ticks an item off, or back on. Allowed on finalized lists too.
    pub async fn mark_item_ordered(
        &self,
        actor: &User,
        list_id: i64,
        item_id: i64,
        ordered: bool,
    ) -> Result<ShoppingList> {
        authorize(actor)?;

        let mut list = self.lists.get_by_id(list_id).await?;
        list.item_mut(item_id)
            .ok_or_else(|| KitchenError::not_found("ShoppingListItem", item_id))?
            .is_ordered = ordered;

        let list = self.lists.update(&list).await?;
        info!(shopping_list_id = list_id, item_id, ordered, "shopping list item marked");
        Ok(list)
    }

    pub async fn finalize(&self, actor: &User, list_id: i64) -> Result<ShoppingList> {
        authorize(actor)?;

        let mut list = self.lists.get_by_id(list_id).await?;
        list.finalize().inspect_err(|e| {
            warn!(shopping_list_id = list_id, error = %e, "finalize refused");
        })?;

        let list = self.lists.record_finalization(&list).await?;
        info!(
            shopping_list_id = list_id,
            outstanding = list.outstanding().count(),
            "shopping list finalized"
        );
        Ok(list)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<ShoppingList> {
        self.lists.get_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<ShoppingList>> {
        self.lists.get_all().await
    }

    pub async fn find_by_status(&self, status: ShoppingListStatus) -> Result<Vec<ShoppingList>> {
        self.lists.find_by_status(status).await
    }

    pub async fn find_by_delivery_date(&self, delivery_date: NaiveDate) -> Result<Option<ShoppingList>> {
        self.lists.find_by_delivery_date(delivery_date).await
    }

    async fn draft_list(&self, list_id: i64) -> Result<ShoppingList> {
        let list = self.lists.get_by_id(list_id).await?;
        if list.is_finalized() {
            return Err(KitchenError::illegal_state(format!(
                "Shopping list {} is finalized and its items can no longer change",
                list_id
            )));
        }
        Ok(list)
    }
}

fn authorize(actor: &User) -> Result<()> {
    actor.authorize(Action::ManageShoppingLists).inspect_err(|e| {
        warn!(actor = %actor.email, error = %e, "shopping list access refused");
    })
}
