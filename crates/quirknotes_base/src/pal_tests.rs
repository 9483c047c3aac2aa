/* 📖 # PAL trait test suite

Exercises the Pal trait through PalHandle, so the default methods
(read_file_to_string, write_file) are covered the way the store and config
loader actually call them.
*/

#[cfg(test)]
mod pal_trait_tests {
    use crate::ErrorKind;
    use crate::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpService, HttpStatusCode};
    use crate::pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
    use crate::QuirkResult;

    #[test]
    fn test_pal_handle_deref() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("notes.json"), b"[]".to_vec());

        let handle = PalHandle::new(mock);
        let clone = handle.clone();
        assert!(clone.file_exists(&FilePath::from("notes.json")).unwrap());
    }

    #[test]
    fn test_pal_handle_shares_mock_state() {
        let mock = MockPal::new();
        let handle = PalHandle::new(mock.clone());

        handle
            .write_file(&FilePath::from("notes.json"), br#"[{"_id":"x"}]"#)
            .unwrap();
        assert_eq!(
            mock.file_content(&FilePath::from("notes.json")),
            Some(br#"[{"_id":"x"}]"#.to_vec())
        );
    }

    #[test]
    fn test_read_file_to_string_default_impl() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("quirknotes.toml"), b"[server]\nport = 4000".to_vec());

        let content = mock
            .read_file_to_string(&FilePath::from("quirknotes.toml"))
            .unwrap();
        assert_eq!(content, "[server]\nport = 4000");
    }

    #[test]
    fn test_read_file_to_string_invalid_utf8() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("bad.json"), vec![0xFF, 0xFE]);

        let result = mock.read_file_to_string(&FilePath::from("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_file_overwrites() {
        let mock = MockPal::new();
        let path = FilePath::from("notes.json");
        mock.write_file(&path, b"first").unwrap();
        mock.write_file(&path, b"second").unwrap();
        assert_eq!(mock.read_file_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_missing_file_is_file_error() {
        let handle = PalHandle::new(MockPal::new());
        let err = handle
            .read_file_to_string(&FilePath::from("missing.json"))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::FileError { .. }));
    }

    #[derive(Debug)]
    struct StatusService(HttpStatusCode);

    impl HttpService for StatusService {
        fn handle_request(&self, _request: HttpRequest) -> QuirkResult<HttpResponse> {
            Ok(HttpResponse::new(self.0))
        }
    }

    #[test]
    fn test_mock_servers_are_independent() {
        let mock = MockPal::new();
        let handle = PalHandle::new(mock.clone());

        let first = handle
            .start_http_server(
                Box::new(StatusService(HttpStatusCode::Ok)),
                HttpServerConfig::default(),
            )
            .unwrap();
        let second = handle
            .start_http_server(
                Box::new(StatusService(HttpStatusCode::NoContent)),
                HttpServerConfig::default(),
            )
            .unwrap();
        assert_ne!(first.port(), second.port());
        assert_eq!(mock.http_server_count(), 2);

        let response = mock
            .simulate_request(second.port(), HttpRequest::new(HttpMethod::Get, "/"))
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NoContent);
    }

    #[test]
    fn test_real_and_mock_agree_on_missing_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let real = PalHandle::new(RealPal::new(temp_dir.path().to_path_buf()));
        let mock = PalHandle::new(MockPal::new());

        for pal in [real, mock] {
            let path = FilePath::from("notes.json");
            assert!(!pal.file_exists(&path).unwrap());
            pal.write_file(&path, b"[]").unwrap();
            assert!(pal.file_exists(&path).unwrap());
            assert_eq!(pal.read_file_to_string(&path).unwrap(), "[]");
        }
    }
}
