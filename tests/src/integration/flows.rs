//! # Integration Test Flows
//!
//! End-to-end scenarios against the in-memory adapters:
//!
//! 1. **Multi-envelope**: deposit → wait → disburse, capacity, ordering,
//!    eligibility boundary, concurrent disbursement
//! 2. **Single-lock**: delegated deposit → withdraw by the beneficiary only
//! 3. **Persistence**: snapshot → restore → reopen with custody intact
//! 4. **Telemetry**: ledger activity shows up in the Prometheus export

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use escrow_ledger::prelude::*;
    use escrow_ledger::{capture_snapshot, restore_snapshot, LedgerSnapshot};

    const START: Timestamp = 1_700_000_000;
    const ONE_YEAR: u64 = 365 * 24 * 60 * 60;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    struct EnvelopeFixture {
        ledger: Arc<EnvelopeLedger<InMemoryEnvelopeStore>>,
        payouts: Arc<InMemoryPayouts>,
        clock: Arc<ManualClock>,
    }

    async fn envelope_fixture() -> EnvelopeFixture {
        let payouts = Arc::new(InMemoryPayouts::new());
        let clock = Arc::new(ManualClock::new(START));
        let ledger = EnvelopeLedger::open(
            LedgerConfig::default(),
            Arc::new(InMemoryEnvelopeStore::new()),
            payouts.clone(),
            clock.clone(),
        )
        .await
        .unwrap();
        EnvelopeFixture {
            ledger: Arc::new(ledger),
            payouts,
            clock,
        }
    }

    struct LockFixture {
        ledger: SingleLockLedger<InMemoryLockStore>,
        payouts: Arc<InMemoryPayouts>,
        clock: Arc<ManualClock>,
    }

    async fn lock_fixture() -> LockFixture {
        let payouts = Arc::new(InMemoryPayouts::new());
        let clock = Arc::new(ManualClock::new(START));
        let ledger = SingleLockLedger::open(
            LedgerConfig::default(),
            Arc::new(InMemoryLockStore::new()),
            payouts.clone(),
            clock.clone(),
        )
        .await
        .unwrap();
        LockFixture {
            ledger,
            payouts,
            clock,
        }
    }

    // =============================================================================
    // MULTI-ENVELOPE FLOWS
    // =============================================================================

    /// A billion units locked for a year are released in full, once.
    #[tokio::test]
    async fn test_one_year_lock_released_after_a_year() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));

        f.ledger
            .deposit(depositor, START + ONE_YEAR, payee, 1_000_000_000)
            .await
            .unwrap();

        f.clock.advance_time(ONE_YEAR - 1);
        assert!(matches!(
            f.ledger.disburse(depositor, payee).await,
            Err(EscrowError::NothingEligibleYet { .. })
        ));

        f.clock.advance_time(1);
        assert_eq!(f.ledger.disburse(depositor, payee).await, Ok(1_000_000_000));
        assert_eq!(f.payouts.balance_of(&payee), 1_000_000_000);
        assert_eq!(f.ledger.total_locked().await.unwrap(), 0);
        assert!(f
            .ledger
            .get_deposit_envelopes(depositor, payee)
            .await
            .unwrap()
            .is_empty());
    }

    /// A payee with no envelopes from this depositor gets nothing.
    #[tokio::test]
    async fn test_unrelated_payee_cannot_disburse() {
        let f = envelope_fixture().await;
        let (depositor, payee, stranger) = (addr(0x01), addr(0x02), addr(0x03));

        f.ledger.deposit(depositor, START, payee, 500).await.unwrap();

        let err = f.ledger.disburse(depositor, stranger).await.unwrap_err();
        assert!(matches!(err, EscrowError::NoEnvelopesForKey { .. }));
        assert_eq!(
            err.to_string(),
            "There is no deposit envelops for given depositor and payee."
        );
        assert_eq!(f.payouts.total_paid(), 0);
        assert_eq!(f.ledger.total_locked().await.unwrap(), 500);
    }

    /// Disbursing before any envelope unlocks reports the historic message.
    #[tokio::test]
    async fn test_disburse_before_unlock_is_rejected() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));

        f.ledger
            .deposit(depositor, START + 1_000, payee, 500)
            .await
            .unwrap();
        f.clock.advance_time(100);

        let err = f.ledger.disburse(depositor, payee).await.unwrap_err();
        assert!(matches!(
            err,
            EscrowError::NothingEligibleYet {
                next_unlock: Some(unlock),
                ..
            } if unlock == START + 1_000
        ));
        assert_eq!(
            err.to_string(),
            "There is no eligible deposit envelops for disbursement for given depositor and payee."
        );
        assert_eq!(f.payouts.total_paid(), 0);
        assert_eq!(f.ledger.total_locked().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_eleventh_deposit_rejected() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));

        for i in 0..10u64 {
            f.ledger
                .deposit(depositor, START + i, payee, 100)
                .await
                .unwrap();
        }
        let err = f
            .ledger
            .deposit(depositor, START, payee, 100)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "You cannot have more than 10 deposits for one payee."
        );

        // Disbursing frees the slots again.
        f.clock.advance_time(100);
        assert_eq!(f.ledger.disburse(depositor, payee).await, Ok(1_000));
        f.ledger.deposit(depositor, START, payee, 100).await.unwrap();
    }

    #[tokio::test]
    async fn test_surviving_envelopes_keep_deposit_order() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));
        let unlocks = [40u64, 5, 60, 15, 50, 25];

        for (i, offset) in unlocks.iter().enumerate() {
            f.ledger
                .deposit(depositor, START + offset, payee, (i as Amount + 1) * 10)
                .await
                .unwrap();
        }

        f.clock.advance_time(30);
        // Eligible: offsets 5, 15, 25 => amounts 20 + 40 + 60.
        assert_eq!(f.ledger.disburse(depositor, payee).await, Ok(120));

        let remaining: Vec<_> = f
            .ledger
            .get_deposit_envelopes(depositor, payee)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.locked_until - START)
            .collect();
        assert_eq!(remaining, vec![40, 60, 50]);
    }

    #[tokio::test]
    async fn test_eligibility_boundary() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));
        let t = START + 1_000;

        f.ledger.deposit(depositor, t, payee, 7).await.unwrap();

        f.clock.set_time(t - 1);
        assert_eq!(
            f.ledger.disbursable_amount(depositor, payee).await.unwrap(),
            0
        );
        assert!(f.ledger.disburse(depositor, payee).await.is_err());

        f.clock.set_time(t);
        assert_eq!(
            f.ledger.disbursable_amount(depositor, payee).await.unwrap(),
            7
        );
        assert_eq!(f.ledger.disburse(depositor, payee).await, Ok(7));
    }

    /// Concurrent disbursements of one key release the value exactly once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_disburse_releases_once() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));

        for _ in 0..5 {
            f.ledger.deposit(depositor, START, payee, 200).await.unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&f.ledger);
                tokio::spawn(async move { ledger.disburse(depositor, payee).await })
            })
            .collect();
        let results: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(successes, vec![&1_000]);
        assert_eq!(f.payouts.balance_of(&payee), 1_000);
        assert_eq!(f.ledger.stats().disbursements, 1);
    }

    /// Concurrent deposits on many keys keep custody and storage in step.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deposits_conserve_value() {
        let f = envelope_fixture().await;

        let handles: Vec<_> = (0..40u8)
            .map(|i| {
                let ledger = Arc::clone(&f.ledger);
                tokio::spawn(async move {
                    ledger
                        .deposit(addr(0x01), START, addr(i % 4), Amount::from(i) + 1)
                        .await
                })
            })
            .collect();
        let accepted = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(_))))
            .count();

        assert_eq!(accepted, 40);
        let expected: Amount = (1..=40).sum();
        assert_eq!(f.ledger.total_locked().await.unwrap(), expected);
        assert_eq!(f.ledger.check_conservation().await.unwrap(), None);
    }

    // =============================================================================
    // SINGLE-LOCK FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_delegated_lock_withdrawn_by_beneficiary() {
        let f = lock_fixture().await;
        let (funder, beneficiary) = (addr(0x0F), addr(0x0B));

        f.ledger
            .deposit(funder, START + 60, beneficiary, 2_500)
            .await
            .unwrap();

        let early = f.ledger.withdraw(beneficiary, 2_500).await.unwrap_err();
        assert_eq!(early.to_string(), "You can't withdraw yet.");

        let undelegated = f.ledger.withdraw(funder, 1).await.unwrap_err();
        assert_eq!(
            undelegated.to_string(),
            "You don't have any balance to withdraw."
        );

        f.clock.advance_time(60);
        assert_eq!(f.ledger.withdraw(beneficiary, 2_500).await, Ok(2_500));
        assert_eq!(f.payouts.balance_of(&beneficiary), 2_500);
        assert_eq!(f.payouts.balance_of(&funder), 0);
        assert_eq!(
            f.ledger.get_lock_info(beneficiary).await.unwrap(),
            Envelope::default()
        );
    }

    // =============================================================================
    // PERSISTENCE
    // =============================================================================

    #[tokio::test]
    async fn test_snapshot_restore_reopens_conserved() {
        let f = envelope_fixture().await;
        let (depositor, payee) = (addr(0x01), addr(0x02));
        f.ledger
            .deposit(depositor, START + 10, payee, 300)
            .await
            .unwrap();
        f.ledger.deposit(depositor, START, payee, 200).await.unwrap();
        f.ledger.disburse(depositor, payee).await.unwrap();

        let locks = InMemoryLockStore::new();
        let bytes = capture_snapshot(f.ledger.store(), &locks)
            .encode()
            .unwrap();

        let snapshot = LedgerSnapshot::decode(&bytes).unwrap();
        assert_eq!(snapshot.envelope_total().unwrap(), 300);
        let (envelopes, _locks) = restore_snapshot(snapshot, 10).unwrap();

        let clock = Arc::new(ManualClock::new(START + 10));
        let reopened = EnvelopeLedger::open(
            LedgerConfig::default(),
            Arc::new(envelopes),
            f.payouts.clone(),
            clock,
        )
        .await
        .unwrap();

        assert_eq!(reopened.custody().held, 300);
        assert_eq!(reopened.check_conservation().await.unwrap(), None);
        assert_eq!(reopened.disburse(depositor, payee).await, Ok(300));

        // Sequence numbering resumes after the restored envelopes.
        reopened.deposit(depositor, START, payee, 1).await.unwrap();
        assert_eq!(
            reopened.store().entries()[0].1.slots()[0].seq,
            2
        );
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[tokio::test]
    async fn test_ledger_activity_is_exported() {
        escrow_telemetry::register_metrics().unwrap();
        let f = envelope_fixture().await;

        f.ledger.deposit(addr(0x01), START, addr(0x02), 5).await.unwrap();
        let _ = f.ledger.disburse(addr(0x01), addr(0x09)).await;

        let text = escrow_telemetry::encode_metrics().unwrap();
        assert!(text.contains("escrow_deposits_total"));
        assert!(text.contains("no_envelopes_for_key"));
    }
}
