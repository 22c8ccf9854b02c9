//! Integration tests for the Baskets domain

use core_model::{HashIdCodec, RequestContext, Trashed};
use domain_baskets::*;
use rust_decimal::Decimal;
use test_utils::TestDatabase;

fn codec() -> HashIdCodec {
    HashIdCodec::new("integration", 8)
}

fn line(variant: &str, quantity: u32) -> BasketLine {
    BasketLine {
        variant: variant.to_string(),
        quantity,
        unit_price: Decimal::new(450, 2),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_merge_is_persisted_atomically() {
    let db = TestDatabase::new().await;
    let repo = PgBasketRepository::new(db.connection(), codec());
    let ctx = RequestContext::system().with_user(7);

    let user = repo
        .create(
            &ctx,
            NewBasket {
                user_id: Some(7),
                currency: "GBP".to_string(),
                lines: vec![line("mug", 1)],
            },
        )
        .await
        .unwrap();
    let guest = repo
        .create(
            &ctx,
            NewBasket {
                user_id: None,
                currency: "GBP".to_string(),
                lines: vec![line("mug", 2), line("cap", 1)],
            },
        )
        .await
        .unwrap();

    let merged = repo.merge(&ctx, user.key, guest.key).await.unwrap();
    assert_eq!(merged.lines[0].quantity, 3);
    assert_eq!(merged.total, Decimal::new(1800, 2));

    let trashed = repo.find(guest.key, Trashed::Only).await.unwrap().unwrap();
    assert_eq!(trashed.merged_id, Some(user.id.clone()));
    assert_eq!(trashed.audit.updated_by, Some(7));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_saved_baskets_belong_to_their_owner() {
    let db = TestDatabase::new().await;
    let baskets = PgBasketRepository::new(db.connection(), codec());
    let saved = PgSavedBasketRepository::new(db.connection(), codec());
    let ctx = RequestContext::system().with_user(7);

    let basket = baskets
        .create(
            &ctx,
            NewBasket {
                user_id: Some(7),
                currency: "GBP".to_string(),
                lines: vec![],
            },
        )
        .await
        .unwrap();
    let kept = saved
        .create(&ctx, basket.key, 7, "Weekly".to_string())
        .await
        .unwrap();
    assert_eq!(kept.basket_id, basket.id);

    assert_eq!(saved.list_for_user(7).await.unwrap().len(), 1);
    assert!(saved.list_for_user(8).await.unwrap().is_empty());

    saved.delete(&ctx, kept.key).await.unwrap();
    assert!(saved.find(kept.key).await.unwrap().is_none());
}
