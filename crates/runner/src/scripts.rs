//! Scripts evaluated inside the remote context.
//!
//! All state lives on one namespaced store, `globalThis.__fragmentBridge`:
//! `registry` maps content hashes to lazy module loaders and `modules` caches the
//! loaded records by the same hash.

/// Global the store is installed under
pub const STORE_GLOBAL: &str = "__fragmentBridge";

/// Installs the empty store; safe to run more than once
pub const BOOTSTRAP: &str = r#"() => {
  globalThis.__fragmentBridge ||= { registry: {}, modules: {} };
  return true;
}"#;

/// Truthy once the registry knows `hash`
pub const HAS_ENTRY: &str = r#"(hash) => {
  const store = globalThis.__fragmentBridge;
  return !!(store && store.registry && Object.prototype.hasOwnProperty.call(store.registry, hash));
}"#;

/// Loads the module behind `hash` and describes its record as `{ named, anonymous }`
/// maps of key to function source
pub const LOAD_RECORD: &str = r#"async ({ hash }) => {
  const store = globalThis.__fragmentBridge;
  const loaded = await store.registry[hash]();
  const record = loaded.default || {};
  store.modules[hash] = record;
  const describe = (section) =>
    Object.fromEntries(Object.entries(section || {}).map(([key, fn]) => [key, String(fn)]));
  return { named: describe(record.named), anonymous: describe(record.anonymous) };
}"#;

/// Calls `record[section][key](data)` and returns the awaited result
pub const INVOKE: &str = r#"async ({ hash, section, key, data }) => {
  const record = globalThis.__fragmentBridge.modules[hash];
  return await record[section][key](data);
}"#;

/// Entry-module snippet that registers the generated `registry.js` into the store.
///
/// `registry_specifier` is how the page's entry module imports the registry file.
pub fn install_snippet(registry_specifier: &str) -> String {
    let specifier = serde_json::Value::from(registry_specifier).to_string();
    format!(
        "import {{ registry }} from {specifier};\n\
         const store = (globalThis.{STORE_GLOBAL} ||= {{ registry: {{}}, modules: {{}} }});\n\
         Object.assign(store.registry, registry);\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_use_the_namespaced_store() {
        for script in [BOOTSTRAP, HAS_ENTRY, LOAD_RECORD, INVOKE] {
            assert!(script.contains(STORE_GLOBAL), "{script}");
        }
    }

    #[test]
    fn install_snippet_quotes_the_specifier() {
        let snippet = install_snippet("./.fragments/registry.js");
        assert!(snippet.starts_with("import { registry } from \"./.fragments/registry.js\";\n"));
        assert!(snippet.contains("globalThis.__fragmentBridge ||="));
    }
}
