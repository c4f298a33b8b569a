//! Selection semantics end to end: multi-choice merging, stale values,
//! silent single-choice skips, and persistence round trips.

use super::test_utils::TestEnv;
use flagforge::selection::ChoiceValue;
use flagforge::settings::Settings;
use serde_json::json;
use std::path::PathBuf;

const CDN: &str = "https://cdn.example.com/";
const MANIFEST_URL: &str = "https://flags.example.com/m.json";

/// One item with a multi-choice feature: packs perf/net selected by
/// default, extra left out.
fn packs_env() -> (TestEnv, PathBuf) {
    let mut env = TestEnv::new();
    let install = env.add_install("fff000");

    let perf = env.add_fragment(CDN, "packs/perf.json", &json!({ "DFIntPerfLevel": 3 }));
    let net = env.add_fragment(CDN, "packs/net.json", &json!({ "DFIntNetBudget": 64 }));
    let extra = env.add_fragment(CDN, "packs/extra.json", &json!({ "FFlagExtraPack": true }));

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Tweaks": {
                "base_url": CDN,
                "default": true,
                "features": [
                    {
                        "name": "packs",
                        "options": { "perf": [perf], "net": [net], "extra": [extra] },
                        "default": ["perf", "net"],
                        "min": 1
                    }
                ]
            }
        }),
    );

    (env, install)
}

#[tokio::test]
async fn test_multi_choice_defaults_merge_selected_options() {
    let (env, install) = packs_env();

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert_eq!(document["DFIntPerfLevel"], 3);
    assert_eq!(document["DFIntNetBudget"], 64);
    assert!(document.get("FFlagExtraPack").is_none());
}

#[tokio::test]
async fn test_resolve_is_exactly_base_then_default_options() {
    let mut env = TestEnv::new();

    let core = env.add_fragment(CDN, "base/core.json", &json!({ "FFlagCore": true }));
    let ui = env.add_fragment(CDN, "base/ui.json", &json!({ "FFlagUi": true }));
    let perf = env.add_fragment(CDN, "packs/perf.json", &json!({ "DFIntPerfLevel": 3 }));
    let net = env.add_fragment(CDN, "packs/net.json", &json!({ "DFIntNetBudget": 64 }));
    let extra = env.add_fragment(CDN, "packs/extra.json", &json!({ "FFlagExtraPack": true }));

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Tweaks": {
                "base_url": CDN,
                "default": true,
                "files": [core, ui],
                "features": [
                    {
                        "name": "packs",
                        "options": { "perf": [perf], "net": [net], "extra": [extra] },
                        "default": ["perf", "net"]
                    }
                ]
            }
        }),
    );

    let fragments = env.pipeline().resolve().await.unwrap();

    // exactly the base files, then the defaulted options, in declared order
    let expected: Vec<&str> = [&core, &ui, &perf, &net]
        .iter()
        .map(|fragment| fragment["hash"]["digest"].as_str().unwrap())
        .collect();
    assert_eq!(fragments.len(), expected.len());
    for (fragment, digest) in fragments.iter().zip(expected) {
        assert!(fragment.ends_with(digest));
    }
}

#[tokio::test]
async fn test_multi_choice_override_replaces_defaults() {
    let (mut env, install) = packs_env();
    env.settings.set_feature_choice(
        "Tweaks",
        "packs",
        ChoiceValue::Many(vec!["extra".to_string()]),
    );

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert!(document.get("DFIntPerfLevel").is_none());
    assert!(document.get("DFIntNetBudget").is_none());
    assert_eq!(document["FFlagExtraPack"], true);
}

#[tokio::test]
async fn test_stale_multi_selection_fails_apply() {
    let (mut env, _) = packs_env();
    env.settings.set_feature_choice(
        "Tweaks",
        "packs",
        ChoiceValue::Many(vec!["perf".to_string(), "legacy".to_string()]),
    );

    let err = env.pipeline().apply(false).await.unwrap_err();
    assert!(err.to_string().contains("Unknown selection 'legacy'"));
}

#[tokio::test]
async fn test_single_choice_without_match_is_skipped() {
    let mut env = TestEnv::new();
    let install = env.add_install("fff000");

    let base = env.add_fragment(CDN, "base.json", &json!({ "FFlagBase": true }));
    let modern = env.add_fragment(CDN, "modern.json", &json!({ "FFlagModern": true }));

    // the declared default names no option; the feature contributes nothing
    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Theme": {
                "base_url": CDN,
                "default": true,
                "files": [base],
                "features": [
                    {
                        "name": "style",
                        "options": { "modern": [modern] },
                        "default": "classic"
                    }
                ]
            }
        }),
    );

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert_eq!(document["FFlagBase"], true);
    assert!(document.get("FFlagModern").is_none());
}

#[tokio::test]
async fn test_merge_order_is_first_key_occurrence_last_value() {
    let mut env = TestEnv::new();
    let install = env.add_install("fff000");

    let first = env.add_fragment(CDN, "a.json", &json!({ "Alpha": 1, "Beta": 2 }));
    let second = env.add_fragment(CDN, "b.json", &json!({ "Beta": 3, "Gamma": 4 }));

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": { "base_url": CDN, "default": true, "files": [first, second] }
        }),
    );

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["Alpha", "Beta", "Gamma"]);
    assert_eq!(document["Beta"], 3);
}

#[tokio::test]
async fn test_selection_survives_settings_roundtrip() {
    let (mut env, install) = packs_env();
    env.settings.set_feature_choice(
        "Tweaks",
        "packs",
        ChoiceValue::Many(vec!["net".to_string()]),
    );

    let settings_path = env.temp.path().join("settings.json");
    env.settings.save(&settings_path).unwrap();
    env.settings = Settings::load(&settings_path).unwrap();

    env.pipeline().apply(false).await.unwrap();

    let document = env.written_document(&install);
    assert!(document.get("DFIntPerfLevel").is_none());
    assert_eq!(document["DFIntNetBudget"], 64);
}
