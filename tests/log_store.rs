#[cfg(test)]
mod tests {
    use medtalk::store::{ConversationTurn, LogStore, UserInfo};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open_at(dir.path()).unwrap();
        (dir, store)
    }

    fn turn(user: &str, bot: &str) -> ConversationTurn {
        ConversationTurn::new(user, bot, Some("p001".to_string()), Some("chat".to_string()))
    }

    #[test]
    fn appended_turns_keep_their_order() {
        let (_dir, store) = test_store();

        let path = store.append_log("p001", "chat", "20250101", &turn("머리가 아파요", "언제부터요?")).unwrap();
        store.append_log("p001", "chat", "20250101", &turn("어제부터요", "어디가요?")).unwrap();

        assert!(path.ends_with("p001/medical_conversation_chat_20250101.json"));
        let logs = store.read_log("p001", "chat", "20250101").unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].user_message, "머리가 아파요");
        assert_eq!(logs[1].bot_response, "어디가요?");
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let (_dir, store) = test_store();
        assert!(store.read_log("nobody", "chat", "20250101").unwrap().is_empty());
        assert!(store.latest_conversation_log("nobody").unwrap().is_empty());
    }

    #[test]
    fn latest_conversation_log_picks_newest_day() {
        let (_dir, store) = test_store();
        store.append_log("p001", "chat", "20250101", &turn("old", "old")).unwrap();
        store.append_log("p001", "practice", "20250301", &turn("new", "new")).unwrap();
        store.append_log("p001", "chat", "20250201", &turn("mid", "mid")).unwrap();

        let latest = store.latest_conversation_log("p001").unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].user_message, "new");
    }

    #[test]
    fn singletons_never_overwrite() {
        let (_dir, store) = test_store();

        let first = store.write_singleton("p001", "feedback", &json!({"n": 1})).unwrap();
        let second = store.write_singleton("p001", "feedback", &json!({"n": 2})).unwrap();
        assert_ne!(first, second);

        let files = store.list_files("p001").unwrap();
        assert_eq!(files.iter().filter(|f| f.starts_with("feedback_")).count(), 2);
    }

    #[test]
    fn singletons_are_filtered_by_name() {
        let (_dir, store) = test_store();
        store.write_singleton("p001", "feedback", &json!({"n": 1})).unwrap();
        store.write_singleton("p001", "cheatsheet", &json!({"n": 2})).unwrap();

        let today = medtalk::store::clock::today();
        assert_eq!(store.read_singletons("p001", "feedback", &today).unwrap().len(), 1);
        assert!(store.read_singletons("p001", "feedback", "19990101").unwrap().is_empty());
        assert_eq!(store.latest_singleton("p001", "cheatsheet").unwrap(), Some(json!({"n": 2})));
    }

    #[test]
    fn unreadable_feedback_is_skipped() {
        let (dir, store) = test_store();
        store.write_singleton("p001", "feedback", &json!({"ok": true})).unwrap();
        std::fs::write(dir.path().join("p001/feedback_20000101_000000.json"), "not json").unwrap();

        let records = store.read_singletons("p001", "feedback", "").unwrap();
        assert_eq!(records, vec![json!({"ok": true})]);
    }

    #[test]
    fn ndjson_appends_one_line_per_record() {
        let (_dir, store) = test_store();
        let path = store.append_ndjson("p001", "quest_analysis", "20250101", &json!({"a": 1})).unwrap();
        store.append_ndjson("p001", "quest_analysis", "20250101", &json!({"a": 2})).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"a":2}"#]);
    }

    #[test]
    fn user_info_round_trips() {
        let (_dir, store) = test_store();
        assert!(store.read_user_info("p001").unwrap().is_none());

        let info = UserInfo {
            participant_id: "p001".to_string(),
            symptoms: json!(["두통", "발열"]),
            consent: json!(true),
            login_time: json!("2025-01-01T09:00:00"),
            created_at: "2025-01-01T09:00:01".to_string(),
        };
        store.write_user_info(&info).unwrap();

        let read = store.read_user_info("p001").unwrap().unwrap();
        assert_eq!(read, info);
        assert_eq!(read.symptoms_text(), "두통, 발열");
    }

    #[test]
    fn audio_is_found_in_root_and_participant_dirs() {
        let (_dir, store) = test_store();
        let shared = store.write_audio(None, b"root").unwrap();
        let owned = store.write_audio(Some("p001"), b"mine").unwrap();

        let shared_name = shared.file_name().unwrap().to_str().unwrap();
        let owned_name = owned.file_name().unwrap().to_str().unwrap();
        assert_eq!(store.find_audio(shared_name).unwrap(), Some(shared.clone()));
        assert_eq!(store.find_audio(owned_name).unwrap(), Some(owned.clone()));
        assert_eq!(store.find_audio("missing.mp3").unwrap(), None);
    }

    #[test]
    fn traversal_names_are_rejected() {
        let (_dir, store) = test_store();
        assert!(store.read_log("../etc", "chat", "20250101").is_err());
        assert!(store.find_audio("../secret.mp3").is_err());
        assert!(store.read_raw("p001", "a/b.json").is_err());
    }

    #[test]
    fn participants_are_listed_sorted() {
        let (_dir, store) = test_store();
        store.ensure_participant_dir("p002").unwrap();
        store.ensure_participant_dir("p001").unwrap();
        store.write_audio(None, b"x").unwrap();

        assert_eq!(store.list_participants().unwrap(), vec!["p001", "p002"]);
    }
}
