//! End-to-end pipeline scenarios: load, normalize, merge, write.

use super::test_utils::TestEnv;
use flagforge::selection::ChoiceValue;
use serde_json::json;
use std::path::PathBuf;

const CDN: &str = "https://cdn.example.com/";
const MANIFEST_URL: &str = "https://flags.example.com/m.json";

/// One manifest with a base-files item and a single-choice renderer
/// feature defaulting to dx11.
fn graphics_env() -> (TestEnv, PathBuf) {
    let mut env = TestEnv::new();
    let install = env.add_install("8f2f3a");

    let base = env.add_fragment(
        CDN,
        "fastflags/base.json",
        &json!({ "FFlagDebugMode": true, "DFIntTimeoutMs": 5000 }),
    );
    let dx11 = env.add_fragment(
        CDN,
        "graphics/dx11.json",
        &json!({ "FFlagRendererDX11": true }),
    );
    let vulkan = env.add_fragment(
        CDN,
        "graphics/vulkan.json",
        &json!({ "FFlagRendererVulkan": true }),
    );

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "FastFlags": {
                "title": "Baseline fast flags",
                "base_url": CDN,
                "default": true,
                "files": [base]
            },
            "Graphics": {
                "base_url": CDN,
                "default": true,
                "features": [
                    {
                        "name": "renderer",
                        "options": { "dx11": [dx11], "vulkan": [vulkan] },
                        "default": "dx11"
                    }
                ]
            }
        }),
    );

    (env, install)
}

#[tokio::test]
async fn test_apply_writes_merged_document_to_installs() {
    let (env, install) = graphics_env();

    let summary = env.pipeline().apply(false).await.unwrap();
    assert_eq!(summary.manifests, 1);
    assert_eq!(
        summary.enabled_items,
        vec!["FastFlags".to_string(), "Graphics".to_string()]
    );
    assert_eq!(summary.written.len(), 1);
    assert!(!summary.dry_run);

    let document = env.written_document(&install);
    assert_eq!(document["FFlagDebugMode"], true);
    assert_eq!(document["DFIntTimeoutMs"], 5000);
    assert_eq!(document["FFlagRendererDX11"], true);
    assert!(document.get("FFlagRendererVulkan").is_none());
}

#[tokio::test]
async fn test_selection_override_switches_renderer() {
    let (mut env, install) = graphics_env();
    env.settings
        .set_feature_choice("Graphics", "renderer", ChoiceValue::One("vulkan".to_string()));

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert!(document.get("FFlagRendererDX11").is_none());
    assert_eq!(document["FFlagRendererVulkan"], true);
    // base flags are unaffected by the feature switch
    assert_eq!(document["FFlagDebugMode"], true);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let (env, install) = graphics_env();

    let summary = env.pipeline().apply(true).await.unwrap();
    assert!(summary.dry_run);
    assert!(summary.written.is_empty());
    assert_eq!(summary.targets.len(), 1);
    assert!(summary.targets[0].ends_with("version-8f2f3a"));
    // the document is still fully merged for inspection
    assert_eq!(summary.document["FFlagRendererDX11"], true);
    assert!(!install.join("ClientSettings").exists());
}

#[tokio::test]
async fn test_disabled_item_contributes_nothing() {
    let (mut env, install) = graphics_env();
    env.settings.set_item_enabled("FastFlags", false);

    let summary = env.pipeline().apply(false).await.unwrap();
    assert_eq!(summary.enabled_items, vec!["Graphics".to_string()]);

    let document = env.written_document(&install);
    assert!(document.get("FFlagDebugMode").is_none());
    assert_eq!(document["FFlagRendererDX11"], true);
}

#[tokio::test]
async fn test_duplicate_item_last_manifest_wins() {
    let mut env = TestEnv::new();
    let install = env.add_install("aaa111");

    let first = env.add_fragment(CDN, "first.json", &json!({ "FFlagShared": 1 }));
    let second = env.add_fragment(
        CDN,
        "second.json",
        &json!({ "FFlagShared": 2, "FFlagExtra": 3 }),
    );

    env.add_remote_manifest(
        "https://flags.example.com/first.json",
        &json!({
            "Flags": { "base_url": CDN, "default": true, "files": [first] }
        }),
    );
    env.add_remote_manifest(
        "https://flags.example.com/second.json",
        &json!({
            "Flags": { "base_url": CDN, "default": true, "files": [second] }
        }),
    );

    let summary = env.pipeline().apply(false).await.unwrap();
    assert_eq!(summary.manifests, 2);
    assert_eq!(summary.enabled_items, vec!["Flags".to_string()]);

    let document = env.written_document(&install);
    assert_eq!(document["FFlagShared"], 2);
    assert_eq!(document["FFlagExtra"], 3);
}

#[tokio::test]
async fn test_offline_skips_remote_sources() {
    let mut env = TestEnv::new();
    env.add_install("bbb222");

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Remote": { "base_url": CDN, "default": true, "files": [] }
        }),
    );
    env.add_local_manifest(
        "local.json",
        r#"{ "Local": { "base_url": "https://cdn.example.com/", "default": true, "files": [] } }"#,
    );

    let summary = env.pipeline().offline(true).apply(false).await.unwrap();
    assert_eq!(summary.manifests, 1);
    assert_eq!(summary.enabled_items, vec!["Local".to_string()]);
    assert_eq!(env.request_count_for(MANIFEST_URL), 0);
}

#[tokio::test]
async fn test_resolve_order_is_base_then_selected_option() {
    let mut env = TestEnv::new();

    // unverified base file plus a verified file per renderer option
    env.fetcher.insert(
        "https://cdn.example.com/base.json",
        serde_json::to_vec(&json!({ "FFlagBase": true })).unwrap(),
    );
    let dx11 = env.add_fragment(CDN, "dx11.json", &json!({ "FFlagDX11": true }));
    let vulkan = env.add_fragment(CDN, "vulkan.json", &json!({ "FFlagVulkan": true }));

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "FastFlags": {
                "base_url": CDN,
                "default": true,
                "files": [
                    { "path": "base.json", "hash": { "algorithm": "none" } }
                ],
                "features": [
                    {
                        "name": "Graphics",
                        "options": { "DX11": [dx11], "Vulkan": [vulkan] },
                        "default": "DX11"
                    }
                ]
            }
        }),
    );

    let fragments = env.pipeline().resolve().await.unwrap();
    assert_eq!(fragments.len(), 2);
    let dx11_digest = dx11["hash"]["digest"].as_str().unwrap();
    assert!(fragments[1].ends_with(dx11_digest));

    // switching the selection swaps only the option fragment
    env.settings
        .set_feature_choice("FastFlags", "Graphics", ChoiceValue::One("Vulkan".to_string()));
    let switched = env.pipeline().resolve().await.unwrap();
    assert_eq!(switched.len(), 2);
    assert_eq!(switched[0], fragments[0]);
    let vulkan_digest = vulkan["hash"]["digest"].as_str().unwrap();
    assert!(switched[1].ends_with(vulkan_digest));
}

#[tokio::test]
async fn test_local_manifest_overrides_remote_item() {
    let mut env = TestEnv::new();
    let install = env.add_install("ccc333");

    let remote_fragment = env.add_fragment(CDN, "remote.json", &json!({ "FFlagSource": "remote" }));
    let local_fragment = env.add_fragment(CDN, "local.json", &json!({ "FFlagSource": "local" }));

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": { "base_url": CDN, "default": true, "files": [remote_fragment] }
        }),
    );
    // local manifests load after remote ones, so their declarations win
    let local_text = serde_json::to_string(&json!({
        "Flags": { "base_url": CDN, "default": true, "files": [local_fragment] }
    }))
    .unwrap();
    env.add_local_manifest("override.json", &local_text);

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert_eq!(document["FFlagSource"], "local");
}
