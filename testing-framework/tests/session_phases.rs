// Test phases sharing one session directory: artifacts written by a phase
// are read by the next one, and the audit trail keeps growing across them.

#![allow(clippy::disallowed_methods)]

mod common;

use anyhow::Result;
use common::Fixture;
use shardnet_testing_framework::prelude::*;

#[tokio::test(start_paused = true)]
async fn test_artifacts_survive_across_phases() -> Result<()> {
    let fixture = Fixture::new(TestNetworkBuilder::new()).await?;

    // Phase 1: deploy and record
    {
        let mut session = fixture.session().await?;
        let owner = session.user("owner")?;
        session.sync_users(&[owner.clone()]).await?;

        session.set_step("setup");
        let (pending, adder) = session
            .build_deploy(&owner, &ContractDeploy::new(ADDER_CODE, 20_000_000).arg(7u128))
            .await?;
        session.save_address("adder", &adder).await?;
        session
            .session()
            .save_token("rose", &TokenDescriptor::new("ROSE-0a1b2c", 18))
            .await?;
        assert!(session.send_and_await(&pending).await?.is_success());

        session.destroy().await?;
        assert!(matches!(session.load_address("adder"), Err(HarnessError::SessionClosed)));
    }

    // Phase 2: a fresh context on the same directory
    let mut session = fixture.session().await?;
    let adder = session.load_address("adder")?;
    assert_eq!(
        session.session().load_token("rose")?,
        TokenDescriptor::new("ROSE-0a1b2c", 18)
    );
    assert!(matches!(
        session.load_address("missing"),
        Err(HarnessError::NotFound { kind: EntryKind::Address, .. })
    ));

    session.set_step("check");
    let sum = session.query_biguint(&ContractQuery::new(adder, "getSum")).await?;
    session.snapshot("sum", serde_json::json!({ "sum": sum.to_string() }), None)?;
    assert_eq!(sum, 7);

    let report = session.generate_report().await?;
    let steps: Vec<&str> = report.events.iter().map(|e| e.step.as_str()).collect();
    assert_eq!(steps, vec!["setup", "setup", "setup", "check"]);
    assert!(report.events.windows(2).all(|w| w[0].sequence < w[1].sequence));

    // Repeated generation does not touch the events
    assert_eq!(session.generate_report().await?, report);
    Ok(())
}

#[tokio::test]
async fn test_missing_profile_fails_to_load() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let err = TestSessionBuilder::new("nowhere", dir.path())
        .with_provider(Arc::new(TestNetworkBuilder::new().build()))
        .build()
        .await
        .err()
        .expect("session without profile");
    assert!(matches!(err, HarnessError::SessionLoad { .. }));
    Ok(())
}
