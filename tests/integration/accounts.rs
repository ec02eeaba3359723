use crate::IntegrationHarness;
use anyhow::Result;
use learnbase::auth::FederatedProfile;
use learnbase::progression::CoinBalance;

#[test]
fn sign_up_then_sign_in_round_trips() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();

    let record = ctx.sign_up("ada@example.com", "correct horse", "Ada")?.clone();
    assert_eq!(record.display_name, "Ada");
    assert_eq!(record.coins, CoinBalance::Coins(5));
    let user_id = record.user_id;

    ctx.sign_out()?;
    assert!(ctx.record().is_err(), "signed-out sessions have no record");

    let record = ctx.sign_in("ada@example.com", "correct horse")?;
    assert_eq!(record.user_id, user_id, "sign-in resolves the same account");
    Ok(())
}

#[test]
fn wrong_credentials_are_rejected() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    ctx.sign_up("ada@example.com", "correct horse", "Ada")?;
    ctx.sign_out()?;

    assert!(ctx.sign_in("ada@example.com", "wrong horse").is_err());
    assert!(ctx.sign_in("nobody@example.com", "whatever").is_err());
    assert!(ctx.record().is_err(), "a failed sign-in leaves the session unauthenticated");
    Ok(())
}

#[test]
fn duplicate_sign_up_is_rejected() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    ctx.sign_up("ada@example.com", "correct horse", "Ada")?;
    ctx.sign_out()?;

    let err = ctx
        .sign_up("ada@example.com", "other pass", "Imposter")
        .unwrap_err();
    assert!(err.to_string().contains("already exists"), "unexpected: {err}");
    Ok(())
}

#[test]
fn federated_sign_in_mints_and_then_matches_an_account() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    let profile = FederatedProfile {
        provider: "google".into(),
        email: "grace@example.com".into(),
        display_name: Some("Grace".into()),
    };

    let first = ctx.sign_in_federated(&profile)?.clone();
    assert_eq!(first.display_name, "Grace");
    ctx.sign_out()?;

    let second = ctx.sign_in_federated(&profile)?;
    assert_eq!(second.user_id, first.user_id, "same email resolves the same account");
    Ok(())
}

#[test]
fn display_name_falls_back_to_the_email_local_part() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    let profile = FederatedProfile {
        provider: "google".into(),
        email: "linus@example.com".into(),
        display_name: None,
    };

    let record = ctx.sign_in_federated(&profile)?;
    assert_eq!(record.display_name, "linus");
    Ok(())
}

#[test]
fn progression_features_require_an_identity() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context();

    assert!(ctx.record().is_err());
    assert!(ctx.progress_summary().is_err());
    assert!(ctx.start_lesson("python", "intro").is_err());
    Ok(())
}
