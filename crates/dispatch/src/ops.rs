//! Composed back-office operations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use waveline_core::{CurrencyCode, DomainError, DomainResult, Money};
use waveline_costs::{Cost, CostLedger, ProfitReport, profitability};
use waveline_currency::CurrencyConverter;
use waveline_settlement::{PaymentLine, PaymentReconciler};
use waveline_shipments::{
    ChildRef, Convoy, ConvoyStatus, Order, OrderStatus, Parcel, ParcelStatus, PickupDetails, Wave,
    WaveStatus,
};

use crate::ports::{AccountDirectory, RateSource, ShipmentBackend};

/// Pickup/delivery input gathered by the UI: receiver metadata plus the
/// split-payment batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupRequest {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_id_number: String,
    pub note: Option<String>,
    pub payments: Vec<PaymentLine>,
}

impl PickupRequest {
    fn details(&self, now: DateTime<Utc>) -> PickupDetails {
        PickupDetails {
            receiver_name: self.receiver_name.clone(),
            receiver_phone: self.receiver_phone.clone(),
            receiver_id_number: self.receiver_id_number.clone(),
            note: self.note.clone(),
            picked_up_at: now,
        }
    }
}

/// Business-order delivery input. Only this request carries the debt
/// override; the Express pickup path has no such field, so the stricter
/// parcel policy is enforced by the types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub pickup: PickupRequest,
    /// Deliver even if the balance is not cleared, acknowledged by the
    /// caller beforehand (the UI shows a confirmation dialog).
    pub allow_with_debt: bool,
}

/// Runs the full gate for each UI action: payment-line validation, the
/// reconciler, the lifecycle check, then the backend mutation.
#[derive(Debug)]
pub struct Dispatcher<B, D> {
    backend: B,
    accounts: D,
    reconciler: PaymentReconciler,
}

impl<B: ShipmentBackend, D: AccountDirectory> Dispatcher<B, D> {
    pub fn new(backend: B, accounts: D) -> Self {
        Self {
            backend,
            accounts,
            reconciler: PaymentReconciler::default(),
        }
    }

    pub fn with_reconciler(backend: B, accounts: D, reconciler: PaymentReconciler) -> Self {
        Self {
            backend,
            accounts,
            reconciler,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Express pickup: settle the balance in full, then deliver.
    ///
    /// Retrying against an already-delivered parcel is a no-op success, so
    /// callers may safely retry after a timeout. On
    /// [`DomainError::ConcurrentModification`] the in-memory entity is
    /// stale; refetch before retrying.
    pub fn pickup_parcel(
        &mut self,
        parcel: &mut Parcel,
        request: &PickupRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if parcel.status == ParcelStatus::Delivered {
            info!(parcel = %parcel.id, "pickup retried on delivered parcel; no-op");
            return Ok(());
        }

        self.validate_payment_lines(&request.payments, &parcel.currency)?;

        let outcome = self.reconciler.evaluate_settlement(
            parcel.total_paid,
            parcel.total_amount,
            &request.payments,
            parcel.has_debt(),
        )?;

        parcel.mark_delivered(outcome.new_total_paid, request.details(now))?;
        self.backend.submit_parcel(parcel, &request.payments)
    }

    /// Business delivery: like pickup, but the caller may override the
    /// debt gate. With the override active the tendered batch is still
    /// credited (clamped), and the order is delivered carrying its
    /// residual debt.
    pub fn deliver_order(
        &mut self,
        order: &mut Order,
        request: &DeliveryRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if order.status == OrderStatus::Delivered {
            info!(order = %order.id, "delivery retried on delivered order; no-op");
            return Ok(());
        }

        self.validate_payment_lines(&request.pickup.payments, &order.currency)?;

        let enforce_debt = order.has_debt() && !request.allow_with_debt;
        let outcome = self.reconciler.evaluate_settlement(
            order.total_paid,
            order.total_amount,
            &request.pickup.payments,
            enforce_debt,
        )?;

        if request.allow_with_debt && outcome.remaining_debt > Decimal::ZERO {
            warn!(
                order = %order.id,
                remaining_debt = %outcome.remaining_debt,
                "delivering with residual debt under caller override"
            );
        }

        order.mark_delivered(outcome.new_total_paid, request.pickup.details(now))?;
        self.backend.submit_order(order, &request.pickup.payments)
    }

    /// Settle the remainder of an order delivered with residual debt.
    pub fn confirm_remaining_payment(&mut self, order: &mut Order) -> DomainResult<()> {
        order.confirm_remaining_payment()?;
        self.backend.submit_order(order, &[])
    }

    /// Close a convoy/trip: stage the supplied cost batch (upsert by id,
    /// else insert), check the closure preconditions, then persist. The
    /// ledger is only committed when the closure succeeds.
    pub fn close_convoy(
        &mut self,
        convoy: &mut Convoy,
        children: &[ChildRef],
        ledger: &mut CostLedger,
        cost_batch: Vec<Cost>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if convoy.status == ConvoyStatus::Closed {
            info!(convoy = %convoy.id, "close retried on closed convoy; no-op");
            return Ok(());
        }

        let mut staged = ledger.clone();
        for cost in cost_batch {
            let account = self.accounts.find_account(cost.account_id);
            staged.record(cost, account.as_ref())?;
        }

        let has_valid_cost = staged.has_valid_cost(|id| self.accounts.find_account(id));
        convoy.close(children, has_valid_cost, now)?;
        *ledger = staged;

        self.backend.submit_convoy_closure(convoy, ledger.costs())
    }

    /// Close a wave once every convoy in it is closed.
    pub fn close_wave(
        &mut self,
        wave: &mut Wave,
        convoys: &[Convoy],
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if wave.status == WaveStatus::Closed {
            info!(wave = %wave.id, "close retried on closed wave; no-op");
            return Ok(());
        }

        wave.close(convoys, now)?;
        self.backend.submit_wave_closure(wave)
    }

    /// Profitability of a journey in `reporting`, from a fresh rate
    /// snapshot.
    pub fn profitability_report(
        &self,
        rates: &impl RateSource,
        revenues: &[Money],
        ledger: &CostLedger,
        reporting: &CurrencyCode,
    ) -> DomainResult<ProfitReport> {
        let table = rates.rates()?;
        let converter = CurrencyConverter::new(&table);
        Ok(profitability(revenues, ledger, reporting, &converter))
    }

    /// Every payment line must carry a positive amount and reference a
    /// distinct, active account whose currency matches the entity being
    /// paid. The reconciler itself only does arithmetic; this is the
    /// caller-side validation its contract requires.
    fn validate_payment_lines(
        &self,
        lines: &[PaymentLine],
        currency: &CurrencyCode,
    ) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for line in lines {
            if line.amount <= Decimal::ZERO {
                return Err(DomainError::validation(
                    "amount",
                    "payment amount must be positive",
                ));
            }
            if !seen.insert(line.account_id) {
                return Err(DomainError::validation(
                    "account_id",
                    format!("account {} used twice in one batch", line.account_id),
                ));
            }
            let account = self
                .accounts
                .find_account(line.account_id)
                .ok_or_else(|| DomainError::not_found(format!("account {}", line.account_id)))?;
            if !account.is_active {
                return Err(DomainError::validation(
                    "account_id",
                    format!("account {} is inactive", account.id),
                ));
            }
            if account.currency != *currency {
                return Err(DomainError::validation(
                    "account_id",
                    format!(
                        "account currency {} does not match entity currency {}",
                        account.currency, currency
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use waveline_core::{Account, AccountId, ConvoyId, OrderId, ParcelId, SettlementReason, WaveId};
    use waveline_costs::CostKind;

    #[derive(Default)]
    struct FakeBackend {
        submissions: usize,
        conflict_on_next: bool,
    }

    impl FakeBackend {
        fn submit(&mut self) -> DomainResult<()> {
            if self.conflict_on_next {
                self.conflict_on_next = false;
                return Err(DomainError::ConcurrentModification {
                    entity: "parcel",
                    id: *ParcelId::new().as_uuid(),
                });
            }
            self.submissions += 1;
            Ok(())
        }
    }

    impl ShipmentBackend for FakeBackend {
        fn submit_order(&mut self, _: &Order, _: &[PaymentLine]) -> DomainResult<()> {
            self.submit()
        }

        fn submit_parcel(&mut self, _: &Parcel, _: &[PaymentLine]) -> DomainResult<()> {
            self.submit()
        }

        fn submit_convoy_closure(&mut self, _: &Convoy, _: &[Cost]) -> DomainResult<()> {
            self.submit()
        }

        fn submit_wave_closure(&mut self, _: &Wave) -> DomainResult<()> {
            self.submit()
        }
    }

    #[derive(Default)]
    struct FakeAccounts(HashMap<AccountId, Account>);

    impl FakeAccounts {
        fn with(accounts: impl IntoIterator<Item = Account>) -> Self {
            Self(accounts.into_iter().map(|a| (a.id, a)).collect())
        }
    }

    impl AccountDirectory for FakeAccounts {
        fn find_account(&self, id: AccountId) -> Option<Account> {
            self.0.get(&id).cloned()
        }
    }

    fn mad() -> CurrencyCode {
        CurrencyCode::new("MAD").unwrap()
    }

    fn mad_account() -> Account {
        Account {
            id: AccountId::new(),
            label: "caisse MAD".into(),
            currency: mad(),
            is_active: true,
        }
    }

    fn parcel(status: ParcelStatus, total: Decimal, paid: Decimal) -> Parcel {
        Parcel {
            id: ParcelId::new(),
            trip_id: ConvoyId::new(),
            wave_id: WaveId::new(),
            status,
            currency: mad(),
            total_amount: total,
            total_paid: paid,
            pickup: None,
        }
    }

    fn order(status: OrderStatus, total: Decimal, paid: Decimal) -> Order {
        Order {
            id: OrderId::new(),
            convoy_id: ConvoyId::new(),
            wave_id: WaveId::new(),
            status,
            currency: mad(),
            total_amount: total,
            total_paid: paid,
            pickup: None,
        }
    }

    fn request(payments: Vec<PaymentLine>) -> PickupRequest {
        PickupRequest {
            receiver_name: "B. Alaoui".into(),
            receiver_phone: "+212600000000".into(),
            receiver_id_number: "MA-5678".into(),
            note: None,
            payments,
        }
    }

    fn dispatcher(accounts: FakeAccounts) -> Dispatcher<FakeBackend, FakeAccounts> {
        Dispatcher::new(FakeBackend::default(), accounts)
    }

    #[test]
    fn full_express_pickup_settles_and_delivers() {
        let account = mad_account();
        let mut dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let mut p = parcel(ParcelStatus::ReadyForPickup, dec!(100), dec!(0));

        let req = request(vec![PaymentLine {
            account_id: account.id,
            amount: dec!(100),
        }]);
        dispatcher.pickup_parcel(&mut p, &req, Utc::now()).unwrap();

        assert_eq!(p.status, ParcelStatus::Delivered);
        assert_eq!(p.total_paid, dec!(100));
        assert!(!p.has_debt());
        assert!(p.pickup.is_some());
        assert_eq!(dispatcher.backend().submissions, 1);
    }

    #[test]
    fn partial_payment_blocks_pickup() {
        let account = mad_account();
        let mut dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let mut p = parcel(ParcelStatus::ReadyForPickup, dec!(100), dec!(0));

        let req = request(vec![PaymentLine {
            account_id: account.id,
            amount: dec!(40),
        }]);
        let err = dispatcher
            .pickup_parcel(&mut p, &req, Utc::now())
            .unwrap_err();

        match err {
            DomainError::SettlementRejected { reason, .. } => {
                assert_eq!(reason, SettlementReason::InsufficientPayment);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Transition was never attempted; nothing persisted.
        assert_eq!(p.status, ParcelStatus::ReadyForPickup);
        assert_eq!(p.total_paid, dec!(0));
        assert_eq!(dispatcher.backend().submissions, 0);
    }

    #[test]
    fn parcel_pickup_has_no_debt_override() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let mut p = parcel(ParcelStatus::ReadyForPickup, dec!(100), dec!(0));

        let err = dispatcher
            .pickup_parcel(&mut p, &request(vec![]), Utc::now())
            .unwrap_err();
        match err {
            DomainError::SettlementRejected { reason, .. } => {
                assert_eq!(reason, SettlementReason::PaymentsRequired);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn pickup_retry_is_a_noop() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let mut p = parcel(ParcelStatus::Delivered, dec!(100), dec!(100));

        dispatcher
            .pickup_parcel(&mut p, &request(vec![]), Utc::now())
            .unwrap();
        assert_eq!(dispatcher.backend().submissions, 0);
    }

    #[test]
    fn concurrent_modification_surfaces_verbatim() {
        let account = mad_account();
        let mut dispatcher = Dispatcher::new(
            FakeBackend {
                conflict_on_next: true,
                ..Default::default()
            },
            FakeAccounts::with([account.clone()]),
        );
        let mut p = parcel(ParcelStatus::ReadyForPickup, dec!(100), dec!(0));

        let req = request(vec![PaymentLine {
            account_id: account.id,
            amount: dec!(100),
        }]);
        let err = dispatcher
            .pickup_parcel(&mut p, &req, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrentModification { .. }));
    }

    #[test]
    fn order_delivery_with_debt_requires_override() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let mut o = order(OrderStatus::ReadyForPickup, dec!(500), dec!(0));

        let err = dispatcher
            .deliver_order(
                &mut o,
                &DeliveryRequest {
                    pickup: request(vec![]),
                    allow_with_debt: false,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::SettlementRejected { .. }));
        assert_eq!(o.status, OrderStatus::ReadyForPickup);
    }

    #[test]
    fn order_debt_override_then_confirm_remaining_payment() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let mut o = order(OrderStatus::ReadyForPickup, dec!(500), dec!(0));

        dispatcher
            .deliver_order(
                &mut o,
                &DeliveryRequest {
                    pickup: request(vec![]),
                    allow_with_debt: true,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(o.status, OrderStatus::Delivered);
        assert!(o.has_debt());

        dispatcher.confirm_remaining_payment(&mut o).unwrap();
        assert_eq!(o.total_paid, dec!(500));
        assert!(!o.has_debt());
        assert_eq!(dispatcher.backend().submissions, 2);
    }

    #[test]
    fn override_still_credits_tendered_payments() {
        let account = mad_account();
        let mut dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let mut o = order(OrderStatus::ReadyForPickup, dec!(500), dec!(0));

        let req = DeliveryRequest {
            pickup: request(vec![PaymentLine {
                account_id: account.id,
                amount: dec!(200),
            }]),
            allow_with_debt: true,
        };
        dispatcher.deliver_order(&mut o, &req, Utc::now()).unwrap();
        assert_eq!(o.total_paid, dec!(200));
        assert!(o.has_debt());
    }

    #[test]
    fn payment_lines_are_validated_against_accounts() {
        let active = mad_account();
        let mut inactive = mad_account();
        inactive.is_active = false;
        let mut cfa_acct = mad_account();
        cfa_acct.currency = CurrencyCode::cfa();

        let mut dispatcher = dispatcher(FakeAccounts::with([
            active.clone(),
            inactive.clone(),
            cfa_acct.clone(),
        ]));
        let mut p = parcel(ParcelStatus::ReadyForPickup, dec!(100), dec!(0));

        // Inactive account.
        let err = dispatcher
            .pickup_parcel(
                &mut p,
                &request(vec![PaymentLine {
                    account_id: inactive.id,
                    amount: dec!(100),
                }]),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "account_id"));

        // Currency mismatch.
        assert!(dispatcher
            .pickup_parcel(
                &mut p,
                &request(vec![PaymentLine {
                    account_id: cfa_acct.id,
                    amount: dec!(100),
                }]),
                Utc::now(),
            )
            .is_err());

        // Duplicate account in one batch.
        assert!(dispatcher
            .pickup_parcel(
                &mut p,
                &request(vec![
                    PaymentLine {
                        account_id: active.id,
                        amount: dec!(50),
                    },
                    PaymentLine {
                        account_id: active.id,
                        amount: dec!(50),
                    },
                ]),
                Utc::now(),
            )
            .is_err());

        // Unknown account.
        assert!(matches!(
            dispatcher
                .pickup_parcel(
                    &mut p,
                    &request(vec![PaymentLine {
                        account_id: AccountId::new(),
                        amount: dec!(100),
                    }]),
                    Utc::now(),
                )
                .unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    fn closable_convoy() -> (Convoy, Vec<ChildRef>) {
        let convoy = Convoy {
            id: ConvoyId::new(),
            wave_id: WaveId::new(),
            status: ConvoyStatus::Arrived,
            end_date: None,
        };
        let children = vec![ChildRef::new(OrderId::new(), OrderStatus::Delivered)];
        (convoy, children)
    }

    fn fuel_cost(account: &Account) -> Cost {
        Cost {
            id: None,
            kind: CostKind::Transport,
            label: "fuel".into(),
            amount: Money::new(dec!(40), account.currency.clone()),
            account_id: account.id,
            notes: None,
        }
    }

    #[test]
    fn close_convoy_records_costs_and_closes() {
        let account = mad_account();
        let mut dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let (mut convoy, children) = closable_convoy();
        let mut ledger = CostLedger::new();

        dispatcher
            .close_convoy(
                &mut convoy,
                &children,
                &mut ledger,
                vec![fuel_cost(&account)],
                Utc::now(),
            )
            .unwrap();

        assert_eq!(convoy.status, ConvoyStatus::Closed);
        assert!(convoy.end_date.is_some());
        assert_eq!(ledger.costs().len(), 1);
        assert_eq!(dispatcher.backend().submissions, 1);
    }

    #[test]
    fn close_convoy_without_costs_is_blocked_and_ledger_untouched() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let (mut convoy, children) = closable_convoy();
        let mut ledger = CostLedger::new();

        let err = dispatcher
            .close_convoy(&mut convoy, &children, &mut ledger, vec![], Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::PreconditionNotMet { .. }));
        assert_eq!(convoy.status, ConvoyStatus::Arrived);
        assert!(ledger.is_empty());
    }

    #[test]
    fn close_convoy_blocked_by_in_transit_child_keeps_ledger() {
        let account = mad_account();
        let mut dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let (mut convoy, _) = closable_convoy();
        let blocker = ChildRef::new(OrderId::new(), OrderStatus::InTransit);
        let mut ledger = CostLedger::new();

        let err = dispatcher
            .close_convoy(
                &mut convoy,
                &[blocker],
                &mut ledger,
                vec![fuel_cost(&account)],
                Utc::now(),
            )
            .unwrap_err();
        match err {
            DomainError::PreconditionNotMet {
                blocking_children, ..
            } => assert_eq!(blocking_children, vec![blocker.id]),
            other => panic!("unexpected error {other:?}"),
        }
        // Staged batch was discarded with the failed closure.
        assert!(ledger.is_empty());
    }

    #[test]
    fn close_retries_are_noops() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let (mut convoy, children) = closable_convoy();
        convoy.status = ConvoyStatus::Closed;
        let mut ledger = CostLedger::new();
        dispatcher
            .close_convoy(&mut convoy, &children, &mut ledger, vec![], Utc::now())
            .unwrap();

        let mut wave = Wave {
            id: WaveId::new(),
            status: WaveStatus::Closed,
            start_date: Utc::now(),
            end_date: None,
        };
        dispatcher.close_wave(&mut wave, &[], Utc::now()).unwrap();
        assert_eq!(dispatcher.backend().submissions, 0);
    }

    #[test]
    fn close_wave_requires_all_convoys_closed() {
        let mut dispatcher = dispatcher(FakeAccounts::default());
        let mut wave = Wave {
            id: WaveId::new(),
            status: WaveStatus::Open,
            start_date: Utc::now(),
            end_date: None,
        };
        let open_convoy = Convoy {
            id: ConvoyId::new(),
            wave_id: wave.id,
            status: ConvoyStatus::Arrived,
            end_date: None,
        };

        let err = dispatcher
            .close_wave(&mut wave, &[open_convoy.clone()], Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::PreconditionNotMet { .. }));

        let mut closed = open_convoy;
        closed.status = ConvoyStatus::Closed;
        dispatcher
            .close_wave(&mut wave, &[closed], Utc::now())
            .unwrap();
        assert_eq!(wave.status, WaveStatus::Closed);
        assert!(wave.end_date.is_some());
    }

    struct FakeRates(waveline_currency::RateTable);

    impl RateSource for FakeRates {
        fn rates(&self) -> DomainResult<waveline_currency::RateTable> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn profitability_report_uses_a_fresh_snapshot() {
        let account = mad_account();
        let dispatcher = dispatcher(FakeAccounts::with([account.clone()]));
        let table = waveline_currency::RateTable::from_rates([
            waveline_currency::rates::RateEntry {
                code: mad(),
                rate_to_cfa: dec!(60),
            },
        ])
        .unwrap();

        let mut ledger = CostLedger::new();
        ledger
            .record(fuel_cost(&account), Some(&account))
            .unwrap();

        let revenues = [Money::new(dec!(100), mad())];
        let report = dispatcher
            .profitability_report(&FakeRates(table), &revenues, &ledger, &CurrencyCode::cfa())
            .unwrap();
        assert_eq!(report.revenue, dec!(6000));
        assert_eq!(report.costs, dec!(2400));
        assert_eq!(report.margin, dec!(3600));
    }
}
