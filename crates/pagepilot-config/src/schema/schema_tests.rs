use super::*;

#[test]
fn test_default_config_sections() {
    let config = Config::default();
    assert_eq!(config.automation.endpoint, "http://localhost:9222");
    assert_eq!(config.timeouts.prepare_ms, 10_000);
    assert_eq!(config.polling.stable_samples, 3);
    assert_eq!(config.limits.max_messages_per_chat, 500);
    assert!(!config.selectors.prompt_input.is_empty());
    assert!(!config.resolution.rewrite_rules.is_empty());
}

#[test]
fn test_partial_sections_keep_defaults() {
    let config: Config = toml::from_str(
        r##"
        [timeouts]
        prepare_ms = 500

        [selectors]
        prompt_input = ["#composer"]
        "##,
    )
    .unwrap();
    assert_eq!(config.timeouts.prepare_ms, 500);
    assert_eq!(config.timeouts.submit_ms, 15_000);
    assert_eq!(config.selectors.prompt_input, vec!["#composer".to_string()]);
    assert!(!config.selectors.submit_button.is_empty());
}

#[test]
fn test_rewrite_rules_from_toml() {
    let config: Config = toml::from_str(
        r#"
        [[resolution.rewrite_rules]]
        pattern = "/thumb/"
        replacement = "/full/"
        "#,
    )
    .unwrap();
    assert_eq!(
        config.resolution.rewrite_rules,
        vec![RewriteRule::new("/thumb/", "/full/")]
    );
}

#[test]
fn test_default_rewrite_rules_compile_and_apply() {
    let rules = ResolutionConfig::default().rewrite_rules;
    let strip_width = regex::Regex::new(&rules[1].pattern).unwrap();
    let out = strip_width.replace("https://cdn.example.com/img/abc.png?w=256", rules[1].replacement.as_str());
    assert_eq!(out, "https://cdn.example.com/img/abc.png");

    let thumb = regex::Regex::new(&rules[0].pattern).unwrap();
    let out = thumb.replace("https://cdn.example.com/a_thumb.webp?v=2", rules[0].replacement.as_str());
    assert_eq!(out, "https://cdn.example.com/a.webp");
}

#[test]
fn test_uniform_timeouts() {
    let t = TimeoutsConfig::uniform(50);
    assert_eq!(t.prepare_ms, 50);
    assert_eq!(t.extract_image_ms, 50);
}
