//! The token fetcher: connect, authenticate, generate, emit.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::platform::{Platform, Token};

/// Base address of the Edelweiss Data API.
pub const DEFAULT_API_URL: &str = "https://api.edelweissdata.com";

/// Fixture location relative to the tool's own directory.
pub const FIXTURE_OFFSET: &str = "../test/src/token.jwt";

/// A path expressed as a base directory plus a relative offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPath {
    pub base: PathBuf,
    pub relative: PathBuf,
}

impl TokenPath {
    pub fn new(base: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), relative: relative.into() }
    }

    /// The test fixture one level above the binary: `<bin dir>/../test/src/token.jwt`.
    pub fn fixture() -> Self {
        Self::fixture_in(utility_dir())
    }

    pub fn fixture_in(base: impl Into<PathBuf>) -> Self {
        Self::new(base, FIXTURE_OFFSET)
    }

    pub fn resolve(&self) -> PathBuf {
        self.base.join(&self.relative)
    }
}

/// Directory holding the running binary, falling back to the working directory.
pub fn utility_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Stdout,
    /// Write the token to a file, then print it.
    File(TokenPath),
}

impl OutputTarget {
    /// Pick the target from the command line: an explicit path wins,
    /// otherwise `save` selects the fixture under `base`.
    pub fn from_args(save: bool, out: Option<PathBuf>, base: Option<PathBuf>) -> Self {
        match (out, save) {
            (Some(path), _) => OutputTarget::File(TokenPath::new(base.unwrap_or_default(), path)),
            (None, true) => OutputTarget::File(match base {
                Some(base) => TokenPath::fixture_in(base),
                None => TokenPath::fixture(),
            }),
            (None, false) => OutputTarget::Stdout,
        }
    }
}

/// Drives the platform through connect, authenticate and token generation.
pub async fn fetch_token<P: Platform>(platform: &P, url: &str) -> Result<Token, FetchError> {
    let handle = platform.connect(url).await?;
    o_debug!("Connected to {}", url);

    let session = platform.authenticate(handle).await?;
    o_debug!("Authenticated");

    let token = platform.generate_token(&session).await?;
    if token.is_empty() {
        return Err(FetchError::TokenGeneration("platform returned an empty token".to_string()));
    }
    Ok(token)
}

/// Writes the token to the target, then prints it to `out`.
///
/// The file is created or truncated and holds the token verbatim with no
/// trailing newline. Missing parent directories are not created.
pub fn emit<W: Write>(token: &Token, target: &OutputTarget, out: &mut W) -> Result<(), FetchError> {
    if let OutputTarget::File(path) = target {
        let path = path.resolve();
        write_token(&path, token)?;
        o_debug!("Token written to {}", path.display());
    }

    writeln!(out, "{}", token).map_err(FetchError::Stdout)?;
    out.flush().map_err(FetchError::Stdout)
}

fn write_token(path: &Path, token: &Token) -> Result<(), FetchError> {
    fs::write(path, token.as_str().as_bytes()).map_err(|source| FetchError::Filesystem {
        path: path.to_path_buf(),
        source,
    })
}

/// One complete run: fetch a single token and emit it to a single target.
pub async fn run<P: Platform, W: Write>(
    platform: &P,
    url: &str,
    target: &OutputTarget,
    out: &mut W,
) -> Result<Token, FetchError> {
    let token = fetch_token(platform, url).await?;
    emit(&token, target, out)?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted platform that records the order of calls.
    struct MockPlatform {
        fail_at: Option<&'static str>,
        token: &'static str,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockPlatform {
        fn ok(token: &'static str) -> Self {
            Self { fail_at: None, token, calls: Mutex::new(Vec::new()) }
        }

        fn failing_at(step: &'static str) -> Self {
            Self { fail_at: Some(step), token: "abc.def.ghi", calls: Mutex::new(Vec::new()) }
        }

        fn record(&self, step: &'static str) -> bool {
            self.calls.lock().unwrap().push(step);
            self.fail_at == Some(step)
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Platform for MockPlatform {
        type Handle = ();
        type Session = ();

        async fn connect(&self, _url: &str) -> Result<(), FetchError> {
            if self.record("connect") {
                return Err(FetchError::Connectivity("unreachable".to_string()));
            }
            Ok(())
        }

        async fn authenticate(&self, _handle: ()) -> Result<(), FetchError> {
            if self.record("authenticate") {
                return Err(FetchError::Authentication("rejected".to_string()));
            }
            Ok(())
        }

        async fn generate_token(&self, _session: &()) -> Result<Token, FetchError> {
            if self.record("generate_token") {
                return Err(FetchError::TokenGeneration("session expired".to_string()));
            }
            Ok(Token::new(self.token))
        }
    }

    #[tokio::test]
    async fn test_print_only_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let platform = MockPlatform::ok("abc.def.ghi");
        let mut out = Vec::new();

        let token = run(&platform, DEFAULT_API_URL, &OutputTarget::Stdout, &mut out).await.unwrap();

        assert_eq!(token.as_str(), "abc.def.ghi");
        assert_eq!(String::from_utf8(out).unwrap(), "abc.def.ghi\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(platform.calls(), vec!["connect", "authenticate", "generate_token"]);
    }

    #[tokio::test]
    async fn test_save_writes_file_and_prints() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("tool");
        fs::create_dir_all(dir.path().join("test/src")).unwrap();
        fs::create_dir_all(&base).unwrap();
        let target = OutputTarget::File(TokenPath::fixture_in(&base));
        let mut out = Vec::new();

        run(&MockPlatform::ok("abc.def.ghi"), DEFAULT_API_URL, &target, &mut out).await.unwrap();

        let written = fs::read_to_string(dir.path().join("test/src/token.jwt")).unwrap();
        assert_eq!(written, "abc.def.ghi");
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", written));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::File(TokenPath::new(dir.path(), "token.jwt"));

        run(&MockPlatform::ok("first.long.token"), DEFAULT_API_URL, &target, &mut Vec::new()).await.unwrap();
        run(&MockPlatform::ok("x.y.z"), DEFAULT_API_URL, &target, &mut Vec::new()).await.unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("token.jwt")).unwrap(), "x.y.z");
    }

    #[tokio::test]
    async fn test_auth_failure_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.jwt");
        fs::write(&path, "old.token.value").unwrap();
        let target = OutputTarget::File(TokenPath::new(dir.path(), "token.jwt"));
        let mut out = Vec::new();

        let err = run(&MockPlatform::failing_at("authenticate"), DEFAULT_API_URL, &target, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Authentication(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "old.token.value");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::File(TokenPath::new(dir.path(), "token.jwt"));

        run(&MockPlatform::failing_at("authenticate"), DEFAULT_API_URL, &target, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(!dir.path().join("token.jwt").exists());
    }

    #[tokio::test]
    async fn test_unreachable_stops_before_token_request() {
        let platform = MockPlatform::failing_at("connect");
        let mut out = Vec::new();

        let err = run(&platform, DEFAULT_API_URL, &OutputTarget::Stdout, &mut out).await.unwrap_err();

        assert!(matches!(err, FetchError::Connectivity(_)));
        assert_eq!(platform.calls(), vec!["connect"]);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_token_generation_failure_prints_nothing() {
        let platform = MockPlatform::failing_at("generate_token");
        let mut out = Vec::new();

        let err = run(&platform, DEFAULT_API_URL, &OutputTarget::Stdout, &mut out).await.unwrap_err();

        assert!(matches!(err, FetchError::TokenGeneration(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let err = fetch_token(&MockPlatform::ok(""), DEFAULT_API_URL).await.unwrap_err();
        assert!(matches!(err, FetchError::TokenGeneration(_)));
    }

    #[test]
    fn test_missing_parent_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::File(TokenPath::new(dir.path(), "missing/token.jwt"));
        let mut out = Vec::new();

        let err = emit(&Token::new("abc.def.ghi"), &target, &mut out).unwrap_err();

        match err {
            FetchError::Filesystem { path, .. } => assert_eq!(path, dir.path().join("missing/token.jwt")),
            other => panic!("Expected Filesystem, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_fixture_path_is_one_level_up() {
        let path = TokenPath::fixture_in("/work/tool").resolve();
        assert_eq!(path, PathBuf::from("/work/tool/../test/src/token.jwt"));
    }

    #[test]
    fn test_default_fixture_follows_running_binary() {
        let exe = std::env::current_exe().unwrap();
        let fixture = TokenPath::fixture();

        assert_eq!(fixture.base, exe.parent().unwrap());
        assert_eq!(fixture.relative, PathBuf::from(FIXTURE_OFFSET));
    }

    #[test]
    fn test_target_from_args() {
        assert_eq!(OutputTarget::from_args(false, None, None), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::from_args(true, None, Some(PathBuf::from("/w"))),
            OutputTarget::File(TokenPath::fixture_in("/w"))
        );
        assert_eq!(
            OutputTarget::from_args(false, Some(PathBuf::from("out.jwt")), None),
            OutputTarget::File(TokenPath::new("", "out.jwt"))
        );
    }
}
