use crate::{day, identity, IntegrationHarness};
use anyhow::Result;
use learnbase::auth::Identity;
use learnbase::progression::{CoinBalance, CompletionOutcome, LessonKey};

fn admin_identity() -> Identity {
    Identity {
        user_id: "user-admin".into(),
        email: "admin@example.com".into(),
        display_name: Some("The Admin".into()),
    }
}

#[test]
fn admin_account_is_created_with_unlimited_coins() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context_with_admin("admin@example.com");

    let record = ctx.engine().load_or_create_on(&admin_identity(), day(2024, 1, 10))?;
    assert!(record.is_admin);
    assert_eq!(record.coins, CoinBalance::Unlimited);
    Ok(())
}

#[test]
fn existing_account_is_promoted_once_the_config_names_it() -> Result<()> {
    let harness = IntegrationHarness::new();

    // Account predates the admin configuration.
    let ctx = harness.context();
    let record = ctx.engine().load_or_create_on(&admin_identity(), day(2024, 1, 10))?;
    assert!(!record.is_admin);

    let ctx = harness.context_with_admin("admin@example.com");
    let record = ctx.engine().load_or_create_on(&admin_identity(), day(2024, 1, 10))?;
    assert!(record.is_admin, "promotion applies on the next load");
    assert_eq!(record.coins, CoinBalance::Unlimited);

    // One-way: dropping the config never demotes the account.
    let paths = learnbase::config::ensure_workspace_at(harness.workspace_path().to_path_buf())?;
    learnbase::config::save(&paths, &learnbase::config::AppConfig::default())?;
    let ctx = harness.context();
    let record = ctx.engine().load_or_create_on(&admin_identity(), day(2024, 1, 11))?;
    assert!(record.is_admin, "admin flag is a one-way latch");
    assert_eq!(record.coins, CoinBalance::Unlimited);
    Ok(())
}

#[test]
fn admin_email_match_is_case_sensitive() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context_with_admin("Admin@Example.com");

    let record = ctx.engine().load_or_create_on(&admin_identity(), day(2024, 1, 10))?;
    assert!(!record.is_admin, "a case variant of the admin address must not match");
    Ok(())
}

#[test]
fn admin_completions_never_run_out_of_coins() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context_with_admin("admin@example.com");
    let admin = admin_identity();
    ctx.engine().load_or_create_on(&admin, day(2024, 1, 10))?;

    for (language, lesson) in [
        ("python", "intro"),
        ("python", "variables"),
        ("python", "data_types"),
        ("javascript", "intro"),
        ("javascript", "variables"),
        ("javascript", "functions"),
        ("rust", "intro"),
        ("rust", "ownership"),
        ("rust", "structs"),
    ] {
        let key = LessonKey::new(language, lesson)?;
        assert_eq!(
            ctx.engine().complete_lesson(&admin.user_id, &key)?,
            CompletionOutcome::Completed,
            "admin completion of {key} must not be coin-gated"
        );
    }

    let record = ctx.engine().load_or_create_on(&admin, day(2024, 1, 10))?;
    assert_eq!(record.coins, CoinBalance::Unlimited, "admin coins are never decremented");
    assert_eq!(record.completed_lessons.len(), 9);
    Ok(())
}

#[test]
fn admin_coin_adjustments_are_a_no_op() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context_with_admin("admin@example.com");
    let admin = admin_identity();
    ctx.engine().load_or_create_on(&admin, day(2024, 1, 10))?;

    ctx.engine().adjust_coins(&admin.user_id, -1000)?;
    let record = ctx.engine().load_or_create_on(&admin, day(2024, 1, 10))?;
    assert_eq!(record.coins, CoinBalance::Unlimited);

    // The admin skips the daily reset entirely.
    let record = ctx.engine().load_or_create_on(&admin, day(2024, 2, 1))?;
    assert_eq!(record.coins, CoinBalance::Unlimited);
    assert_eq!(record.last_login_date, day(2024, 1, 10));
    Ok(())
}

#[test]
fn non_admin_user_is_unaffected_by_admin_config() -> Result<()> {
    let harness = IntegrationHarness::new();
    let ctx = harness.context_with_admin("admin@example.com");
    let user = identity("regular");

    let record = ctx.engine().load_or_create_on(&user, day(2024, 1, 10))?;
    assert!(!record.is_admin);
    assert_eq!(record.coins, CoinBalance::Coins(5));
    Ok(())
}
