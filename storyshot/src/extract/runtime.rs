//! The isolated script execution context backing story extraction.
//!
//! The embedded JavaScript engine's context is not `Send`, so it lives on a
//! dedicated worker thread. Jobs travel to the thread over an unbounded
//! channel and replies come back over oneshot channels, which keeps the
//! async surface of [`ScriptRuntime`] `Send` and usable from any task.
//!
//! One context is exclusively owned by one extraction call and never
//! reused; dropping the [`ScriptRuntime`] disconnects the job channel and
//! the worker thread exits.

use async_trait::async_trait;
use boa_engine::{Context, Source};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{EnvironmentLoadError, StoriesNotFoundError, StoryshotError};

/// Loop iteration ceiling for injected scripts.
const SCRIPT_LOOP_LIMIT: u64 = 10_000_000;

/// Recursion ceiling for injected scripts.
const SCRIPT_RECURSION_LIMIT: usize = 1024;

/// Read access to an execution context's global scope.
///
/// The polling loop is written against this trait so its timing behavior
/// can be driven by a scripted implementation in tests.
#[async_trait]
pub trait StoryRuntime: Send + Sync {
    /// Reads a global binding, returning `None` while it is unpopulated.
    ///
    /// `undefined` and `null` both count as unpopulated. A vanished context
    /// handle surfaces as [`StoriesNotFoundError`].
    async fn read_global(&self, key: &str)
        -> Result<Option<serde_json::Value>, StoryshotError>;
}

type ReadReply = Result<Option<serde_json::Value>, String>;

enum RuntimeJob {
    ReadGlobal {
        key: String,
        resp: oneshot::Sender<ReadReply>,
    },
}

/// A disposable execution context seeded with browser-API stand-ins.
pub struct ScriptRuntime {
    jobs: mpsc::UnboundedSender<RuntimeJob>,
    context_id: Uuid,
}

impl ScriptRuntime {
    /// Builds a context and evaluates `sources` in order against `url`.
    ///
    /// The context's global scope is bootstrapped with `window`/`self`
    /// aliases, a synthetic `location` derived from `url`, and a console
    /// that buffers output for forwarding. Any evaluation failure during
    /// construction fails the whole load with [`EnvironmentLoadError`].
    pub async fn load(
        sources: Vec<String>,
        url: &str,
        debug: bool,
    ) -> Result<Self, StoryshotError> {
        let context_id = Uuid::new_v4();
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (load_tx, load_rx) = oneshot::channel();

        let bootstrap = bootstrap_source(url);
        std::thread::Builder::new()
            .name("storyshot-runtime".to_string())
            .spawn(move || runtime_thread(bootstrap, sources, debug, load_tx, jobs_rx))
            .map_err(|e| EnvironmentLoadError::new(e.to_string()))?;

        match load_rx.await {
            Ok(Ok(())) => {
                debug!(context_id = %context_id, "execution context loaded");
                Ok(Self {
                    jobs: jobs_tx,
                    context_id,
                })
            }
            Ok(Err(detail)) => Err(EnvironmentLoadError::new(detail).into()),
            Err(_) => Err(EnvironmentLoadError::new(
                "execution context thread terminated during load",
            )
            .into()),
        }
    }

    /// The unique id of this context, used in log fields.
    #[must_use]
    pub fn context_id(&self) -> Uuid {
        self.context_id
    }
}

#[async_trait]
impl StoryRuntime for ScriptRuntime {
    async fn read_global(
        &self,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoryshotError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let job = RuntimeJob::ReadGlobal {
            key: key.to_string(),
            resp: resp_tx,
        };

        if self.jobs.send(job).is_err() {
            warn!(context_id = %self.context_id, "execution context handle is gone");
            return Err(StoriesNotFoundError::context_gone(key).into());
        }

        match resp_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(detail)) => Err(StoryshotError::Serialization(detail)),
            Err(_) => Err(StoriesNotFoundError::context_gone(key).into()),
        }
    }
}

impl std::fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("context_id", &self.context_id)
            .finish()
    }
}

/// Worker-thread body: evaluate the injected sources, then serve jobs
/// until the handle side disconnects.
fn runtime_thread(
    bootstrap: String,
    sources: Vec<String>,
    debug: bool,
    load_tx: oneshot::Sender<Result<(), String>>,
    mut jobs: mpsc::UnboundedReceiver<RuntimeJob>,
) {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(SCRIPT_LOOP_LIMIT);
    context
        .runtime_limits_mut()
        .set_recursion_limit(SCRIPT_RECURSION_LIMIT);

    let mut load_result = Ok(());
    for source in std::iter::once(bootstrap.as_str()).chain(sources.iter().map(String::as_str)) {
        if let Err(e) = context.eval(Source::from_bytes(source)) {
            load_result = Err(e.to_string());
            break;
        }
    }
    if debug {
        forward_console(&mut context);
    }

    let failed = load_result.is_err();
    let _ = load_tx.send(load_result);
    if failed {
        return;
    }

    while let Some(job) = jobs.blocking_recv() {
        match job {
            RuntimeJob::ReadGlobal { key, resp } => {
                let reply = read_global_value(&mut context, &key);
                if debug {
                    forward_console(&mut context);
                }
                let _ = resp.send(reply);
            }
        }
    }
}

/// Reads `globalThis[key]` and materializes it as JSON.
fn read_global_value(context: &mut Context, key: &str) -> ReadReply {
    let accessor = format!("globalThis[{}]", encode_js_string(key));
    match context.eval(Source::from_bytes(&accessor)) {
        Ok(value) => {
            if value.is_undefined() || value.is_null() {
                Ok(None)
            } else {
                value.to_json(context).map(Some).map_err(|e| e.to_string())
            }
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Drains the in-context console buffer into the tracing sink.
fn forward_console(context: &mut Context) {
    let drain = "__storyshot_console__.splice(0).join('\\n')";
    if let Ok(value) = context.eval(Source::from_bytes(drain)) {
        if let Some(text) = value.as_string().map(|s| s.to_std_string_escaped()) {
            for line in text.lines().filter(|line| !line.is_empty()) {
                debug!(target: "storyshot::console", "{line}");
            }
        }
    }
}

/// Global-scope bootstrap evaluated before any injected source.
fn bootstrap_source(url: &str) -> String {
    let search = url
        .split_once('?')
        .map(|(_, query)| format!("?{query}"))
        .unwrap_or_default();
    let href = encode_js_string(url);
    let search = encode_js_string(&search);

    format!(
        r"
        var window = globalThis;
        var self = globalThis;
        window.location = {{ href: {href}, search: {search} }};
        var __storyshot_console__ = [];
        (function () {{
          function capture(level) {{
            return function () {{
              var parts = [];
              for (var i = 0; i < arguments.length; i++) {{
                parts.push(String(arguments[i]));
              }}
              __storyshot_console__.push(level + ': ' + parts.join(' '));
            }};
          }}
          window.console = {{
            log: capture('log'),
            info: capture('info'),
            warn: capture('warn'),
            error: capture('error'),
            debug: capture('debug')
          }};
        }})();
        "
    )
}

/// JSON-escapes a string for safe embedding in generated script text.
fn encode_js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::shims::{shim_sources, PREVIEW_URL};
    use tokio_test::assert_ok;

    fn shimmed_sources(preview: &str) -> Vec<String> {
        shim_sources()
            .into_iter()
            .map(str::to_string)
            .chain(std::iter::once(preview.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_and_read_global() {
        let runtime = ScriptRuntime::load(
            shimmed_sources("window.__probe__ = { ready: true };"),
            PREVIEW_URL,
            false,
        )
        .await
        .unwrap();

        let value = tokio_test::assert_ok!(runtime.read_global("__probe__").await);
        assert_eq!(value, Some(serde_json::json!({ "ready": true })));
    }

    #[tokio::test]
    async fn test_unpopulated_global_reads_none() {
        let runtime = ScriptRuntime::load(shimmed_sources("var x = 1;"), PREVIEW_URL, false)
            .await
            .unwrap();

        assert_eq!(runtime.read_global("__missing__").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_global_reads_none() {
        let runtime =
            ScriptRuntime::load(shimmed_sources("window.__probe__ = null;"), PREVIEW_URL, false)
                .await
                .unwrap();

        assert_eq!(runtime.read_global("__probe__").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_syntax_error_fails_load() {
        let err = ScriptRuntime::load(shimmed_sources("this is not javascript"), PREVIEW_URL, false)
            .await
            .unwrap_err();

        assert!(matches!(err, StoryshotError::EnvironmentLoad(_)));
    }

    #[tokio::test]
    async fn test_shims_satisfy_browser_calls() {
        let preview = r"
            var worker = new window.Worker('worker.js');
            worker.postMessage('ping');
            worker.addEventListener('message', function () {});
            worker.terminate();

            window.localStorage.setItem('count', 3);
            var stored = window.localStorage.getItem('count');

            var media = window.matchMedia('(min-width: 600px)');
            media.addListener(function () {});

            window.__probe__ = {
                stored: stored,
                matches: media.matches,
                search: window.location.search
            };
        ";
        let runtime = ScriptRuntime::load(shimmed_sources(preview), PREVIEW_URL, false)
            .await
            .unwrap();

        let value = runtime.read_global("__probe__").await.unwrap().unwrap();
        assert_eq!(value["stored"], serde_json::json!("3"));
        assert_eq!(value["matches"], serde_json::json!(false));
        assert_eq!(
            value["search"],
            serde_json::json!("?selectedKind=none&selectedStory=none")
        );
    }

    #[tokio::test]
    async fn test_read_after_handle_side_effects() {
        // Globals written by earlier evaluation remain visible to later reads.
        let runtime = ScriptRuntime::load(
            shimmed_sources("window.__count__ = 0; window.__count__ += 41;"),
            PREVIEW_URL,
            false,
        )
        .await
        .unwrap();

        assert_eq!(
            runtime.read_global("__count__").await.unwrap(),
            Some(serde_json::json!(41))
        );
        // Repeated reads observe the same final value.
        assert_eq!(
            runtime.read_global("__count__").await.unwrap(),
            Some(serde_json::json!(41))
        );
    }

    #[test]
    fn test_encode_js_string_escapes_quotes() {
        assert_eq!(encode_js_string("__k\"ey__"), "\"__k\\\"ey__\"");
    }
}
