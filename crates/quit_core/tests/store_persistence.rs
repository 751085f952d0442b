use chrono::NaiveDateTime;
use quit_core::item::{BenefitKind, QuitItem};
use quit_core::storage::JsonFileStorage;
use quit_core::store::QuitStore;
use quit_core::{CalendarValue, QuitError};
use tempfile::tempdir;

fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-06-10T08:00:00", "%Y-%m-%dT%H:%M:%S")
        .expect("valid timestamp")
}

#[test]
fn items_survive_a_restart() -> anyhow::Result<()> {
    let temp = tempdir()?;
    let data_dir = temp.path().join("data");

    let store = QuitStore::builder()
        .storage_key("quit-toxic-storage")
        .with_storage(Box::new(JsonFileStorage::new(&data_dir)))
        .build()?;
    assert!(store.is_empty());

    let quit = CalendarValue::new(2024, 5, 1, 8, 0);
    store.add_item(
        QuitItem::new("1", "Smoking", quit)
            .with_description("ten a day")
            .with_benefit(BenefitKind::Money, 6.25, "$"),
    )?;
    store.add_item(QuitItem::new("2", "Doomscrolling", quit).with_benefit(
        BenefitKind::Time,
        45.0,
        "minutes",
    ))?;
    store.delete_item("2")?;
    store.add_item(QuitItem::new("3", "Soda", quit))?;

    let raw = std::fs::read_to_string(data_dir.join("quit-toxic-storage.json"))?;
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(json["items"][0]["benefitType"], "money");
    assert_eq!(json["items"][0]["quitDate"], "2024-06-01T08:00");

    let reopened = QuitStore::builder()
        .storage_key("quit-toxic-storage")
        .with_storage(Box::new(JsonFileStorage::new(&data_dir)))
        .build()?;
    let ids: Vec<String> = reopened.list_items().into_iter().map(|i| i.id).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let statuses = reopened.statuses(now());
    assert_eq!(statuses[0].elapsed_label(), "9d 0h 0m 0s");
    let benefit = statuses[0].benefit.as_ref().expect("money benefit");
    assert_eq!(benefit.display, "$56.25");
    assert!(statuses[1].benefit.is_none());
    Ok(())
}

#[test]
fn corrupt_state_is_reported() -> anyhow::Result<()> {
    let temp = tempdir()?;
    std::fs::write(temp.path().join("broken.json"), "{ not json")?;

    let result = QuitStore::builder()
        .storage_key("broken")
        .with_storage(Box::new(JsonFileStorage::new(temp.path())))
        .build();
    assert!(matches!(result, Err(QuitError::Serialization(_))));
    Ok(())
}
