use chrono::NaiveDate;
use tempfile::TempDir;

use kitchenops::db::init_db;
use kitchenops::models::{
    DayOfWeek, MenuStatus, RequestType, ReviewStatus, Role, ShoppingListStatus, User,
};
use kitchenops::services::{
    NewDishSuggestion, NewIngredientRequest, NewShoppingListItem, Registration, Services,
};
use kitchenops::KitchenError;

struct Kitchen {
    services: Services,
    _temp_dir: TempDir,
}

async fn kitchen() -> Kitchen {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_db(Some(temp_dir.path().join("kitchen.db"))).await.unwrap();
    Kitchen {
        services: Services::new(pool),
        _temp_dir: temp_dir,
    }
}

async fn register(services: &Services, first_name: &str, email: &str, role: Role) -> User {
    services
        .users
        .register(Registration {
            first_name: first_name.to_string(),
            last_name: "Testesen".to_string(),
            email: email.to_string(),
            password: "Kokkeri2025".to_string(),
            role,
            station_id: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn head_chef_approves_pasta_once() {
    let k = kitchen().await;
    let gordon = register(&k.services, "Gordon", "gordon@kitchen.com", Role::HeadChef).await;
    let marco = register(&k.services, "Marco", "marco@grill.com", Role::LineCook).await;

    let station = k
        .services
        .stations
        .create_station(&gordon, "Hot Kitchen", None)
        .await
        .unwrap();

    let pasta = k
        .services
        .dishes
        .suggest(
            &marco,
            NewDishSuggestion {
                name_da: "Pasta".to_string(),
                description_da: "Med tomatsauce".to_string(),
                station_id: station.id.unwrap(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let pasta_id = pasta.id.unwrap();
    assert_eq!(pasta.status(), ReviewStatus::Pending);

    let approved = k.services.dishes.approve(&gordon, pasta_id).await.unwrap();
    assert_eq!(approved.status(), ReviewStatus::Approved);
    assert_eq!(approved.reviewed_by(), gordon.id);
    assert!(approved.reviewed_at().is_some());

    assert!(matches!(
        k.services.dishes.approve(&gordon, pasta_id).await,
        Err(KitchenError::IllegalState(_))
    ));
}

#[tokio::test]
async fn login_and_duplicate_registration() {
    let k = kitchen().await;
    let claire = register(&k.services, "Claire", "claire@pastry.com", Role::ChefDePartie).await;

    let logged_in = k
        .services
        .users
        .login("CLAIRE@pastry.com", "Kokkeri2025")
        .await
        .unwrap();
    assert_eq!(logged_in, claire);

    assert!(matches!(
        k.services.users.login("claire@pastry.com", "wrong-password").await,
        Err(KitchenError::InvalidCredentials)
    ));
    assert!(matches!(
        k.services.users.login("nobody@pastry.com", "Kokkeri2025").await,
        Err(KitchenError::InvalidCredentials)
    ));

    let duplicate = Registration {
        first_name: "Claire".to_string(),
        last_name: "Igen".to_string(),
        email: "Claire@Pastry.com".to_string(),
        password: "Kokkeri2025".to_string(),
        role: Role::LineCook,
        station_id: None,
    };
    assert!(matches!(
        k.services.users.register(duplicate).await,
        Err(KitchenError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn week_seven_menu_is_planned_and_published() {
    let k = kitchen().await;
    let gordon = register(&k.services, "Gordon", "gordon@kitchen.com", Role::HeadChef).await;
    let sous = register(&k.services, "Sofie", "sofie@kitchen.com", Role::SousChef).await;

    let cold = k
        .services
        .stations
        .create_station(&gordon, "Cold Kitchen", None)
        .await
        .unwrap();
    let laks = k
        .services
        .dishes
        .suggest(
            &sous,
            NewDishSuggestion {
                name_da: "Røget Laks".to_string(),
                station_id: cold.id.unwrap(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let laks_id = laks.id.unwrap();
    k.services.dishes.approve(&gordon, laks_id).await.unwrap();

    let menu = k.services.menus.create_menu(&sous, 7, 2025).await.unwrap();
    let menu_id = menu.id.unwrap();
    k.services
        .menus
        .add_slot(&sous, menu_id, DayOfWeek::Monday, cold.id.unwrap(), Some(laks_id))
        .await
        .unwrap();

    let found = k
        .services
        .menus
        .find_by_week_and_year(7, 2025)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, Some(menu_id));
    assert_eq!(found.slots().len(), 1);

    assert!(matches!(
        k.services.menus.find_by_week_and_year(60, 2025).await,
        Err(KitchenError::InvalidArgument(_))
    ));

    let published = k.services.menus.publish(&gordon, menu_id).await.unwrap();
    assert_eq!(published.status(), MenuStatus::Published);
    assert!(matches!(
        k.services.menus.publish(&gordon, menu_id).await,
        Err(KitchenError::IllegalState(_))
    ));

    let dishes = k.services.dishes.find_for_week(7, 2025).await.unwrap();
    assert_eq!(dishes.len(), 1);
    assert_eq!(dishes[0].name_da, "Røget Laks");
}

#[tokio::test]
async fn approved_requests_become_a_shopping_list() {
    let k = kitchen().await;
    let gordon = register(&k.services, "Gordon", "gordon@kitchen.com", Role::HeadChef).await;
    let claire = register(&k.services, "Claire", "claire@pastry.com", Role::LineCook).await;
    let friday = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

    let request = |name: &str, quantity: f64| NewIngredientRequest {
        name: name.to_string(),
        quantity,
        unit: "kg".to_string(),
        request_type: RequestType::GeneralStock,
        delivery_date: friday,
        preferred_supplier: Some("Grønttorvet".to_string()),
        note: None,
        dish_suggestion_id: None,
    };

    for (name, quantity) in [("Smør", 2.0), ("Smør", 3.0), ("Mel", 25.0)] {
        let submitted = k
            .services
            .ingredient_requests
            .submit(&claire, request(name, quantity))
            .await
            .unwrap();
        k.services
            .ingredient_requests
            .approve(&gordon, submitted.id.unwrap())
            .await
            .unwrap();
    }

    let list = k
        .services
        .shopping_lists
        .generate_from_approved_requests(&gordon, friday)
        .await
        .unwrap();
    let list_id = list.id.unwrap();
    assert_eq!(list.items().len(), 2);
    assert_eq!(list.items()[0].quantity(), 5.0);

    let list = k
        .services
        .shopping_lists
        .add_item(
            &gordon,
            list_id,
            NewShoppingListItem {
                ingredient_name: "Æg".to_string(),
                quantity: 60.0,
                unit: "stk".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(list.items().len(), 3);

    let list = k.services.shopping_lists.finalize(&gordon, list_id).await.unwrap();
    assert_eq!(list.status(), ShoppingListStatus::Finalized);
    assert!(matches!(
        k.services.shopping_lists.finalize(&gordon, list_id).await,
        Err(KitchenError::IllegalState(_))
    ));

    let persisted = k.services.shopping_lists.find_by_id(list_id).await.unwrap();
    assert_eq!(persisted.items().len(), 3);
    assert_eq!(persisted.outstanding().count(), 3);
}

#[tokio::test]
async fn new_cook_joins_an_existing_station() {
    let k = kitchen().await;
    let gordon = register(&k.services, "Gordon", "gordon@kitchen.com", Role::HeadChef).await;
    let grill = k
        .services
        .stations
        .create_station(&gordon, "Grill", None)
        .await
        .unwrap();

    let marco = k
        .services
        .users
        .register(Registration {
            first_name: "Marco".to_string(),
            last_name: "Testesen".to_string(),
            email: "marco@grill.com".to_string(),
            password: "Kokkeri2025".to_string(),
            role: Role::LineCook,
            station_id: grill.id,
        })
        .await
        .unwrap();
    assert_eq!(marco.station_id, grill.id);

    let lost = Registration {
        first_name: "Rene".to_string(),
        last_name: "Testesen".to_string(),
        email: "rene@cold.com".to_string(),
        password: "Kokkeri2025".to_string(),
        role: Role::LineCook,
        station_id: Some(9999),
    };
    assert!(matches!(
        k.services.users.register(lost).await,
        Err(KitchenError::NotFound(_))
    ));
}
