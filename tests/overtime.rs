mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::*;
use hr_ledger::error::{LedgerError, ValidationError};
use hr_ledger::ledger::LedgerEngine;
use hr_ledger::model::request::RequestStatus;
use hr_ledger::store::{MemoryStore, Store};

async fn consumed(store: &MemoryStore, source_id: &str) -> Decimal {
    store
        .get_request(source_id)
        .await
        .unwrap()
        .unwrap()
        .consumed_hours
}

/// Alice has an approved earn record `earn-1` of 8 hours with 3 already drawn.
async fn setup() -> (Arc<MemoryStore>, LedgerEngine) {
    let store = Arc::new(seeded_store().with_request(earn_record("earn-1", ALICE, dec!(8), dec!(3))));
    let engine = engine_over(&store).await;
    (store, engine)
}

fn validation(err: LedgerError) -> ValidationError {
    match err {
        LedgerError::Validation(v) => v,
        other => panic!("expected a validation error, got {other}"),
    }
}

#[actix_web::test]
async fn partially_drawn_source_accepts_up_to_its_remainder() {
    let (store, engine) = setup().await;

    let sources = engine.list_available_overtime_sources(ALICE).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].remaining_hours(), dec!(5));

    let err = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(6))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::OverAllocation {
            source_id: "earn-1".into(),
            requested: dec!(6),
            remaining: dec!(5),
        }
    );
    assert_eq!(consumed(&store, "earn-1").await, dec!(3));

    let pay = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(5))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap();
    assert_eq!(pay.value.hours, Some(dec!(5)));
    assert_eq!(consumed(&store, "earn-1").await, dec!(8));
    assert!(engine.list_available_overtime_sources(ALICE).await.unwrap().is_empty());

    // balance only moves once the payout is approved
    assert_eq!(store.get_employee(ALICE).await.unwrap().unwrap().overtime_hours, dec!(0));
    engine
        .set_request_status(&pay.value.id, RequestStatus::Approved, SUPERVISOR, None)
        .await
        .unwrap();
    assert_eq!(store.get_employee(ALICE).await.unwrap().unwrap().overtime_hours, dec!(-5));
    assert_eq!(consumed(&store, "earn-1").await, dec!(8));
}

#[actix_web::test]
async fn stated_hours_must_equal_the_usage_total() {
    let (_, engine) = setup().await;

    let mut draft = usage_draft("OVERTIME_SPEND_DAYS", &[("earn-1", dec!(3))]);
    draft.hours = Some(dec!(4));
    let err = engine
        .create_request(draft, ALICE, RequestStatus::Pending, false)
        .await
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::UsageSumMismatch {
            hours: dec!(4),
            usage_total: dec!(3),
        }
    );
}

#[actix_web::test]
async fn usage_spreads_over_several_sources() {
    let store = Arc::new(
        seeded_store()
            .with_request(earn_record("earn-1", ALICE, dec!(2), dec!(0)))
            .with_request(earn_record("earn-2", ALICE, dec!(4), dec!(1.5))),
    );
    let engine = engine_over(&store).await;

    let pay = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(2)), ("earn-2", dec!(2.5))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap();
    assert_eq!(pay.value.hours, Some(dec!(4.5)));
    assert_eq!(consumed(&store, "earn-1").await, dec!(2));
    assert_eq!(consumed(&store, "earn-2").await, dec!(4));
}

#[actix_web::test]
async fn deleting_a_consumer_releases_its_hours() {
    let (store, engine) = setup().await;

    let pay = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(2))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(5));

    engine.delete_request(&pay.value.id).await.unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(3));
}

#[actix_web::test]
async fn rejecting_releases_and_reopening_redraws() {
    let (store, engine) = setup().await;

    let id = engine
        .create_request(
            usage_draft("OVERTIME_SPEND_DAYS", &[("earn-1", dec!(2))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap()
        .value
        .id;

    engine
        .set_request_status(&id, RequestStatus::Rejected, SUPERVISOR, None)
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(3));

    engine
        .set_request_status(&id, RequestStatus::Pending, SUPERVISOR, None)
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(5));
}

#[actix_web::test]
async fn reopening_fails_when_the_hours_were_taken_meanwhile() {
    let (store, engine) = setup().await;

    let first = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(4))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap()
        .value
        .id;
    engine
        .set_request_status(&first, RequestStatus::Rejected, SUPERVISOR, None)
        .await
        .unwrap();
    engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(4))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(7));

    let err = engine
        .set_request_status(&first, RequestStatus::Approved, SUPERVISOR, None)
        .await
        .unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::OverAllocation { .. }
    ));
    assert_eq!(
        engine.get_request(&first).await.unwrap().status,
        RequestStatus::Rejected
    );
    assert_eq!(consumed(&store, "earn-1").await, dec!(7));
}

#[actix_web::test]
async fn editing_a_consumer_moves_the_difference() {
    let (store, engine) = setup().await;

    let id = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(2))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap()
        .value
        .id;

    engine
        .update_request(&id, usage_draft("OVERTIME_PAY", &[("earn-1", dec!(5))]))
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(8));

    // the request's own draw counts as available when re-validating
    engine
        .update_request(&id, usage_draft("OVERTIME_PAY", &[("earn-1", dec!(1))]))
        .await
        .unwrap();
    assert_eq!(consumed(&store, "earn-1").await, dec!(4));
}

#[actix_web::test]
async fn a_drawn_source_cannot_be_withdrawn() {
    let (store, engine) = setup().await;

    let err = engine
        .set_request_status("earn-1", RequestStatus::Rejected, SUPERVISOR, None)
        .await
        .unwrap_err();
    assert!(matches!(validation(err), ValidationError::SourceInUse { .. }));

    let err = engine.delete_request("earn-1").await.unwrap_err();
    assert!(matches!(validation(err), ValidationError::SourceInUse { .. }));
    assert!(store.get_request("earn-1").await.unwrap().is_some());
}

#[actix_web::test]
async fn foreign_and_unknown_sources_are_refused() {
    let store = Arc::new(
        seeded_store()
            .with_request(earn_record("earn-bob", BOB, dec!(8), dec!(0)))
            .with_request(hr_ledger::model::request::Request {
                status: RequestStatus::Pending,
                ..earn_record("earn-pending", ALICE, dec!(8), dec!(0))
            }),
    );
    let engine = engine_over(&store).await;

    for (source, expected) in [
        ("earn-bob", ValidationError::IneligibleSource("earn-bob".into())),
        ("earn-pending", ValidationError::IneligibleSource("earn-pending".into())),
        ("nope", ValidationError::UnknownSource("nope".into())),
    ] {
        let err = engine
            .create_request(
                usage_draft("OVERTIME_PAY", &[(source, dec!(1))]),
                ALICE,
                RequestStatus::Pending,
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(validation(err), expected);
    }
    assert!(engine.list_available_overtime_sources(ALICE).await.unwrap().is_empty());
}

#[actix_web::test]
async fn residue_below_a_hundredth_is_exhausted() {
    let store = Arc::new(
        seeded_store().with_request(earn_record("earn-1", ALICE, dec!(8), dec!(7.995))),
    );
    let engine = engine_over(&store).await;

    assert!(engine.list_available_overtime_sources(ALICE).await.unwrap().is_empty());
    let err = engine
        .create_request(
            usage_draft("OVERTIME_PAY", &[("earn-1", dec!(0.005))]),
            ALICE,
            RequestStatus::Pending,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(validation(err), ValidationError::OverAllocation { .. }));
}
