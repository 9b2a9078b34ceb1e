use std::time::Duration;

use utsav_tickets::error::TicketsServiceError;
use utsav_tickets::domain::types::{Attendee, GroupTier};
use utsav_tickets::usecase::register::{RegisterForEventUseCase, RegisterInput};
use utsav_tickets::usecase::tickets::GenerateTicketUseCase;

use crate::helpers::{
    CHECK_IN_BASE_URL, MockAnalytics, MockEventRepo, MockGateway, MockMailer,
    MockNotificationStore, MockStorage, MockTicketRepo, MockUserRepo, failed_order, paid_order,
    test_event, test_user,
};

type MockRegisterUseCase = RegisterForEventUseCase<
    MockGateway,
    MockTicketRepo,
    MockEventRepo,
    MockUserRepo,
    MockStorage,
    MockMailer,
    MockNotificationStore,
    MockAnalytics,
>;

struct Harness {
    gateway: MockGateway,
    tickets: MockTicketRepo,
    events: MockEventRepo,
    users: MockUserRepo,
    mailer: MockMailer,
    notifications: MockNotificationStore,
    analytics: MockAnalytics,
}

impl Harness {
    fn new(gateway: MockGateway, events: MockEventRepo, users: MockUserRepo) -> Self {
        Self {
            gateway,
            tickets: MockTicketRepo::new(),
            events,
            users,
            mailer: MockMailer::default(),
            notifications: MockNotificationStore::default(),
            analytics: MockAnalytics::default(),
        }
    }

    fn usecase(&self) -> MockRegisterUseCase {
        RegisterForEventUseCase {
            gateway: self.gateway.clone(),
            tickets: self.tickets.clone(),
            events: self.events.clone(),
            users: self.users.clone(),
            storage: MockStorage::working(),
            mailer: self.mailer.clone(),
            notifications: self.notifications.clone(),
            analytics: self.analytics.clone(),
            check_in_base_url: CHECK_IN_BASE_URL.to_owned(),
        }
    }
}

fn register_input(order_id: &str, event_id: uuid::Uuid, user_id: uuid::Uuid) -> RegisterInput {
    RegisterInput {
        order_id: order_id.to_owned(),
        event_id,
        user_id,
        quantity: Some(1),
        group_tier: None,
        ticket_type: None,
        attendees: vec![],
    }
}

#[tokio::test]
async fn should_register_and_issue_on_verified_payment() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let out = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();

    let ticket = out.ticket.expect("ticket issued");
    assert_eq!(ticket.price, 50_000);
    assert_eq!(ticket.payment_id.as_deref(), Some("9000001"));

    let participants = h.events.participants();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].order_id.as_deref(), Some("ord_1"));
    assert_eq!(participants[0].payment_status, "paid");
    assert_eq!(h.events.current_participants(event.id), 1);
}

#[tokio::test]
async fn should_fail_when_payment_missing() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty(),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let result = h
        .usecase()
        .execute(register_input("ord_missing", event.id, user.id))
        .await;
    assert!(matches!(result, Err(TicketsServiceError::PaymentNotFound)));
    assert!(h.events.participants().is_empty());
}

#[tokio::test]
async fn should_fail_when_payment_not_successful() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(failed_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let result = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await;
    assert!(matches!(
        result,
        Err(TicketsServiceError::PaymentNotSuccessful)
    ));
    assert!(h.events.participants().is_empty());
}

#[tokio::test]
async fn should_prefer_group_tier_quantity() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 400_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let mut input = register_input("ord_1", event.id, user.id);
    input.quantity = Some(2);
    input.group_tier = Some(GroupTier {
        name: "table of eight".to_owned(),
        people: 8,
    });
    h.usecase().execute(input).await.unwrap();

    assert_eq!(h.events.participants()[0].quantity, 8);
    assert_eq!(h.events.current_participants(event.id), 8);
}

#[tokio::test]
async fn should_clamp_requested_quantity() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 500_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let mut input = register_input("ord_1", event.id, user.id);
    input.quantity = Some(25);
    h.usecase().execute(input).await.unwrap();

    assert_eq!(h.events.participants()[0].quantity, 10);
}

#[tokio::test]
async fn should_admit_exactly_one_when_capacity_is_one() {
    let asha = test_user("Asha");
    let ravi = test_user("Ravi");
    let event = test_event(uuid::Uuid::new_v4(), 1);
    let h = Harness::new(
        MockGateway::empty()
            .with_order(paid_order("ord_a", 50_000))
            .with_order(paid_order("ord_b", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![asha.clone(), ravi.clone()]),
    );

    let uc_a = h.usecase();
    let uc_b = h.usecase();
    let (a, b) = tokio::join!(
        uc_a.execute(register_input("ord_a", event.id, asha.id)),
        uc_b.execute(register_input("ord_b", event.id, ravi.id)),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one registration must win");
    let failure = if a.is_err() { a } else { b };
    assert!(matches!(failure, Err(TicketsServiceError::EventFull)));
    assert_eq!(h.events.current_participants(event.id), 1);
    assert_eq!(h.tickets.count(), 1);
}

#[tokio::test]
async fn should_reject_registration_beyond_capacity() {
    let asha = test_user("Asha");
    let ravi = test_user("Ravi");
    let event = test_event(uuid::Uuid::new_v4(), 3);
    let h = Harness::new(
        MockGateway::empty()
            .with_order(paid_order("ord_a", 150_000))
            .with_order(paid_order("ord_b", 100_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![asha.clone(), ravi.clone()]),
    );

    let mut first = register_input("ord_a", event.id, asha.id);
    first.quantity = Some(3);
    h.usecase().execute(first).await.unwrap();

    let mut second = register_input("ord_b", event.id, ravi.id);
    second.quantity = Some(2);
    let result = h.usecase().execute(second).await;

    assert!(matches!(result, Err(TicketsServiceError::EventFull)));
    assert_eq!(h.events.current_participants(event.id), 3);
}

#[tokio::test]
async fn should_report_already_registered_for_different_order() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty()
            .with_order(paid_order("ord_1", 50_000))
            .with_order(paid_order("ord_2", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    h.usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();
    let result = h
        .usecase()
        .execute(register_input("ord_2", event.id, user.id))
        .await;

    assert!(matches!(
        result,
        Err(TicketsServiceError::AlreadyRegistered)
    ));
    assert_eq!(h.events.participants().len(), 1);
}

#[tokio::test]
async fn should_replay_idempotently_for_same_order() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    let first = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();
    // A webhook retry delivers the same order id again.
    let replay = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();

    assert_eq!(
        first.ticket.as_ref().unwrap().id,
        replay.ticket.as_ref().unwrap().id
    );
    assert_eq!(h.events.participants().len(), 1);
    assert_eq!(h.events.current_participants(event.id), 1);
    assert_eq!(h.tickets.count(), 1);
}

#[tokio::test]
async fn should_keep_registration_when_issuance_fails() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    // The user row is missing, so issuance's entity validation fails
    // while the registration itself goes through.
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::empty(),
    );

    let out = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();

    assert!(out.ticket.is_none(), "issuance failure must not fail the flow");
    assert_eq!(h.events.participants().len(), 1);
    assert_eq!(h.tickets.count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn should_dispatch_side_effects_after_registration() {
    let user = test_user("Asha");
    let host = test_user("Meera");
    let event = test_event(host.id, 100);

    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 100_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone(), host.clone()]),
    );

    let mut input = register_input("ord_1", event.id, user.id);
    input.quantity = Some(2);
    input.attendees = vec![Attendee {
        name: "Ravi".to_owned(),
        email: "ravi@example.com".to_owned(),
    }];
    h.usecase().execute(input).await.unwrap();

    // Side effects are detached tasks; give them a beat to drain.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let sent = h.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2, "registrant plus one attendee");
    assert!(sent.iter().any(|e| e.to_email == user.email));
    assert!(sent.iter().any(|e| e.to_email == "ravi@example.com"));
    drop(sent);

    let alerts = h.mailer.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].to_email, host.email);
    drop(alerts);

    assert_eq!(h.notifications.records.lock().unwrap().len(), 1);
    assert_eq!(h.analytics.records.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn should_not_redispatch_side_effects_on_replay() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::new(vec![user.clone()]),
    );

    h.usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();
    h.usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.mailer.sent.lock().unwrap().len(), 1);
    assert_eq!(h.notifications.records.lock().unwrap().len(), 1);
}

// ── Manual recovery via GenerateTicket ───────────────────────────────────────

#[tokio::test]
async fn should_recover_ticket_for_registered_user() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let h = Harness::new(
        MockGateway::empty().with_order(paid_order("ord_1", 50_000)),
        MockEventRepo::new(vec![event.clone()]),
        MockUserRepo::empty(),
    );

    // Registered but ticketless: issuance failed because the user row
    // was missing at registration time.
    let out = h
        .usecase()
        .execute(register_input("ord_1", event.id, user.id))
        .await
        .unwrap();
    assert!(out.ticket.is_none());

    h.users.add(user.clone());
    let uc = GenerateTicketUseCase {
        tickets: h.tickets.clone(),
        events: h.events.clone(),
        users: h.users.clone(),
        storage: MockStorage::working(),
        check_in_base_url: CHECK_IN_BASE_URL.to_owned(),
    };
    let ticket = uc.execute(event.id, user.id).await.unwrap();

    assert_eq!(ticket.price, 50_000, "amount comes from the participant row");
    assert_eq!(ticket.payment_id.as_deref(), Some("9000001"));
    assert_eq!(h.tickets.count(), 1);
}

#[tokio::test]
async fn should_refuse_generate_without_registration() {
    let user = test_user("Asha");
    let event = test_event(uuid::Uuid::new_v4(), 100);
    let uc = GenerateTicketUseCase {
        tickets: MockTicketRepo::new(),
        events: MockEventRepo::new(vec![event.clone()]),
        users: MockUserRepo::new(vec![user.clone()]),
        storage: MockStorage::working(),
        check_in_base_url: CHECK_IN_BASE_URL.to_owned(),
    };

    let result = uc.execute(event.id, user.id).await;
    assert!(matches!(result, Err(TicketsServiceError::NotRegistered)));
}
