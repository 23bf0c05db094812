fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use sharerelay_protocol::{ProgressEvent, RelayRequest, ShareListing};
    use sharerelay_share::{FileInfo, FolderPage, resolve_link};

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  ours:    {reserialized}"
        );
    }

    #[test]
    fn event_stream_lines_are_byte_identical() {
        let text = read_fixture("relay_events.ndjson");
        let mut rebuilt = String::new();
        for line in text.lines() {
            let event = ProgressEvent::from_line(line)
                .unwrap_or_else(|e| panic!("bad event line {line}: {e}"));
            rebuilt.push_str(&event.to_line().unwrap());
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn event_stream_fixture_is_well_formed() {
        let events: Vec<ProgressEvent> = read_fixture("relay_events.ndjson")
            .lines()
            .map(|l| ProgressEvent::from_line(l).unwrap())
            .collect();
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        let Some(ProgressEvent::Complete { ok, total }) = events.last() else {
            panic!("stream must end with complete");
        };
        assert_eq!(*total, terminals);
        assert!(*ok <= *total);
    }

    #[test]
    fn fixture_relay_request() {
        roundtrip_test::<RelayRequest>("relay_request.json");
    }

    #[test]
    fn fixture_share_listing() {
        roundtrip_test::<ShareListing>("share_listing.json");
    }

    #[test]
    fn relay_request_accepts_string_sizes() {
        let mut fixture = load_fixture("relay_request.json");
        fixture["files"][0]["size"] = serde_json::json!("734003200");
        let req: RelayRequest = serde_json::from_value(fixture).unwrap();
        assert_eq!(req.files[0].size, 734_003_200);
    }

    #[test]
    fn fixture_folder_page() {
        let page: FolderPage = serde_json::from_value(load_fixture("folder_page.json")).unwrap();
        assert_eq!(page.next_token(), Some("CiQ2NmY3"));
        assert!(page.files[0].is_folder());
        assert_eq!(page.files[1].size, 734_003_200);
        assert_eq!(page.files[1].mime_type, "video/x-matroska");
    }

    #[test]
    fn fixture_file_info_link_priority() {
        let fixture = load_fixture("file_info.json");
        let info: FileInfo = serde_json::from_value(fixture["file_info"].clone()).unwrap();
        assert_eq!(resolve_link(&info), "https://dl.example.com/ep01.mkv?sig=2");
    }
}
