//! Browser-API stand-ins injected into the preview execution context.
//!
//! These are plain configuration data, not business logic: each constant is
//! a JavaScript source fragment evaluated before the caller's preview code
//! so that code touching Workers, localStorage, or matchMedia does not
//! crash inside the headless environment.

/// The well-known global key the host's serialization call populates.
pub const DEFAULT_STORIES_KEY: &str = "__storybook_stories__";

/// Placeholder navigable URL for the execution context.
///
/// Never dereferenced; the dummy `selectedKind`/`selectedStory` query
/// parameters exist only to satisfy preview-code expectations.
pub const PREVIEW_URL: &str = "https://example.com/iframe.js?selectedKind=none&selectedStory=none";

/// Worker constructor stand-in that no-ops all lifecycle methods.
pub const WORKER_SHIM: &str = r"
    window.Worker = function Worker(script) {
      this.postMessage = function () {};
      this.addEventListener = function () {};
      this.removeEventListener = function () {};
      this.terminate = function () {};
    };
";

/// In-memory localStorage stand-in, installed as a read-only property.
///
/// `setItem` coerces values to strings, matching the storage API contract.
pub const LOCAL_STORAGE_SHIM: &str = r"
    (function () {
      var store = {};
      var storage = {
        getItem: function (key) {
          return store[key];
        },
        setItem: function (key, value) {
          store[key] = String(value);
        },
        clear: function () {
          store = {};
        }
      };
      Object.defineProperty(window, 'localStorage', { value: storage });
    })();
";

/// matchMedia stand-in returning a static non-matching result.
pub const MATCH_MEDIA_SHIM: &str = r"
    window.matchMedia = window.matchMedia || function () {
      return {
        matches: false,
        addListener: function () {},
        removeListener: function () {}
      };
    };
";

/// The full shim sequence, in the fixed order they are injected.
#[must_use]
pub fn shim_sources() -> Vec<&'static str> {
    vec![WORKER_SHIM, LOCAL_STORAGE_SHIM, MATCH_MEDIA_SHIM]
}
