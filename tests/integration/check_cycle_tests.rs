use super::*;
use scout_watcher::{check_once, CheckConfig, CycleRunner};

#[tokio::test]
async fn test_cycle_notifies_once_for_first_qualifying_row() -> anyhow::Result<()> {
    let config = get_test_config();
    let sessions = Arc::new(StubSessionFactory::with_rows(table(&[
        &["Jita", "HS", "15"],
        &["Haimeh", "NS", "5"],
        &["Thera", "WH", "2"],
    ])));
    let notifier = Arc::new(RecordingNotifier::default());
    let checker = create_test_checker(&config, Arc::clone(&sessions), Arc::clone(&notifier));

    let outcome = checker
        .run_cycle(&CheckConfig::new("Haimeh", 10.0, 5)?)
        .await?;

    assert!(outcome.notified());
    assert_eq!(outcome.matched.unwrap().label, "Haimeh");

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].subject, "Condition Met on EVE Scout");
    assert_eq!(
        events[0].body,
        "The condition 'Haimeh' was found with distance 5 in the data table."
    );
    Ok(())
}

#[tokio::test]
async fn test_session_closed_after_every_cycle() -> anyhow::Result<()> {
    let config = get_test_config();
    let notifier = Arc::new(RecordingNotifier::default());
    let check = CheckConfig::new("Haimeh", 10.0, 5)?;

    // no qualifying row
    let quiet = Arc::new(StubSessionFactory::with_rows(table(&[&["Jita", "HS", "40"]])));
    let checker = create_test_checker(&config, Arc::clone(&quiet), Arc::clone(&notifier));
    checker.run_cycle(&check).await?;
    assert_eq!(quiet.opened(), 1);
    assert_eq!(quiet.closed(), 1);

    // zero rows aborts the cycle, the page still closes
    let empty = Arc::new(StubSessionFactory::with_rows(Vec::new()));
    let checker = create_test_checker(&config, Arc::clone(&empty), Arc::clone(&notifier));
    assert!(checker.run_cycle(&check).await.is_err());
    assert_eq!(empty.opened(), 1);
    assert_eq!(empty.closed(), 1);

    assert!(notifier.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_session_released_off_the_runtime_thread() -> anyhow::Result<()> {
    let config = get_test_config();
    let notifier = Arc::new(RecordingNotifier::default());
    let check = CheckConfig::new("Haimeh", 10.0, 5)?;
    let runtime_thread = std::thread::current().id();

    let quiet = Arc::new(StubSessionFactory::with_rows(table(&[&["Jita", "HS", "40"]])));
    let checker = create_test_checker(&config, Arc::clone(&quiet), Arc::clone(&notifier));
    checker.run_cycle(&check).await?;

    let empty = Arc::new(StubSessionFactory::with_rows(Vec::new()));
    let checker = create_test_checker(&config, Arc::clone(&empty), Arc::clone(&notifier));
    assert!(checker.run_cycle(&check).await.is_err());

    // the test runtime is single threaded, so any other thread is the blocking pool
    for threads in [quiet.closed_on(), empty.closed_on()] {
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], runtime_thread);
    }
    Ok(())
}

#[tokio::test]
async fn test_check_once_swallows_launch_failure() -> anyhow::Result<()> {
    let config = get_test_config();
    let sessions = Arc::new(StubSessionFactory::failing());
    let notifier = Arc::new(RecordingNotifier::default());
    let checker = create_test_checker(&config, Arc::clone(&sessions), Arc::clone(&notifier));

    let outcome = check_once(&checker, &CheckConfig::new("Haimeh", 10.0, 5)?).await;

    assert!(outcome.is_none());
    assert!(notifier.events().is_empty());
    Ok(())
}
