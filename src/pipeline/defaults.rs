//! The stock rule table

use crate::cli::BuildOptions;
use crate::config::ProjectConfig;

use super::{AssetClass, MatchPattern, PipelineError, PipelineRule, RuleTable, Scope, TransformStep};

fn emit(name: &str) -> TransformStep {
    TransformStep::new("emit").with("name", name)
}

fn extract() -> TransformStep {
    TransformStep::new("extract")
}

fn html() -> TransformStep {
    TransformStep::new("html")
}

/// Build the rule table for a run.
///
/// The entry markup template is claimed by its own rule through an exact
/// file include, and the generic template rule excludes the same file.
pub fn default_rules(
    options: &BuildOptions,
    config: &ProjectConfig,
) -> Result<RuleTable, PipelineError> {
    let entry_markup = config.entry_markup_path(&options.root);
    let source_map = !options.production;

    let markup = PipelineRule::new(
        "markup",
        AssetClass::Markup,
        MatchPattern::extensions(&["html", "htm"])?,
    )
    .then(html())
    .then(extract())
    .then(emit("[name].html"));

    let entry = PipelineRule::new(
        "entry-markup",
        AssetClass::EntryMarkup,
        MatchPattern::extensions(&["pug"])?,
    )
    .include(Scope::File(entry_markup.clone()))
    .then(TransformStep::new("pug-render"))
    .then(TransformStep::new("raw"))
    .then(extract())
    .then(html())
    .then(extract())
    .then(emit("[name].html"));

    let templates = PipelineRule::new(
        "templates",
        AssetClass::Template,
        MatchPattern::extensions(&["pug", "jade"])?,
    )
    .exclude(Scope::File(entry_markup))
    .then(TransformStep::new("pug"));

    let scripts = PipelineRule::new(
        "scripts",
        AssetClass::Script,
        MatchPattern::extensions(&["ts", "tsx"])?,
    )
    .then(TransformStep::new("typescript").with("allow_ts_in_node_modules", true));

    let mut styles = PipelineRule::new(
        "styles",
        AssetClass::Style,
        MatchPattern::extensions(&["scss", "sass"])?,
    );
    if let Some(main) = config.main_stylesheet_path(&options.root) {
        styles = styles.include(Scope::File(main));
    }
    let styles = styles
        .then(TransformStep::new("sass").with("source_map", source_map))
        .then(TransformStep::new("css").with("source_map", source_map))
        .then(extract())
        .then(emit("[contenthash].css"));

    let images = PipelineRule::new(
        "images",
        AssetClass::Image,
        MatchPattern::extensions(&["png"])?,
    )
    .then(emit("[contenthash].[ext]"));

    let docs = PipelineRule::new(
        "docs",
        AssetClass::Document,
        MatchPattern::extensions(&["md"])?,
    )
    .then(TransformStep::new("markdown"))
    .then(html());

    RuleTable::builder()
        .rule(markup)
        .rule(entry)
        .rule(templates)
        .rule(scripts)
        .rule(styles)
        .rule(images)
        .rule(docs)
        .build()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;

    fn options(production: bool) -> BuildOptions {
        BuildOptions {
            root: PathBuf::from("/site"),
            entry: PathBuf::from("/site/src/index.ts"),
            out_dir: PathBuf::from("/site/public"),
            production,
            watch: false,
        }
    }

    fn class_of(table: &RuleTable, path: &str) -> Option<AssetClass> {
        table.rule_for(Path::new(path)).map(|r| r.asset_class)
    }

    fn chain(table: &RuleTable, name: &str) -> Vec<String> {
        table
            .get(name)
            .unwrap()
            .chain
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    #[test]
    fn test_every_asset_class_is_routed() {
        let table = default_rules(&options(false), &ProjectConfig::default()).unwrap();

        assert_eq!(class_of(&table, "/site/src/about.html"), Some(AssetClass::Markup));
        assert_eq!(class_of(&table, "/site/src/index.pug"), Some(AssetClass::EntryMarkup));
        assert_eq!(class_of(&table, "/site/src/card.pug"), Some(AssetClass::Template));
        assert_eq!(class_of(&table, "/site/src/legacy.jade"), Some(AssetClass::Template));
        assert_eq!(class_of(&table, "/site/src/index.ts"), Some(AssetClass::Script));
        assert_eq!(class_of(&table, "/site/src/view.tsx"), Some(AssetClass::Script));
        assert_eq!(class_of(&table, "/site/src/main.scss"), Some(AssetClass::Style));
        assert_eq!(class_of(&table, "/site/img/logo.png"), Some(AssetClass::Image));
        assert_eq!(class_of(&table, "/site/docs/intro.md"), Some(AssetClass::Document));
        assert_eq!(class_of(&table, "/site/img/logo.jpg"), None);
    }

    #[test]
    fn test_index_template_outside_entry_path_is_a_template() {
        let table = default_rules(&options(false), &ProjectConfig::default()).unwrap();
        assert_eq!(
            class_of(&table, "/site/src/pages/index.pug"),
            Some(AssetClass::Template)
        );
    }

    #[test]
    fn test_chains_are_in_application_order() {
        let table = default_rules(&options(false), &ProjectConfig::default()).unwrap();

        assert_eq!(chain(&table, "markup"), vec!["html", "extract", "emit"]);
        assert_eq!(
            chain(&table, "entry-markup"),
            vec!["pug-render", "raw", "extract", "html", "extract", "emit"]
        );
        assert_eq!(chain(&table, "templates"), vec!["pug"]);
        assert_eq!(chain(&table, "styles"), vec!["sass", "css", "extract", "emit"]);
        assert_eq!(chain(&table, "docs"), vec!["markdown", "html"]);
    }

    #[test]
    fn test_source_maps_follow_production_flag() {
        let dev = default_rules(&options(false), &ProjectConfig::default()).unwrap();
        let prod = default_rules(&options(true), &ProjectConfig::default()).unwrap();

        let flag = |table: &RuleTable| table.get("styles").unwrap().chain[0].options["source_map"].clone();
        assert_eq!(flag(&dev), Value::Bool(true));
        assert_eq!(flag(&prod), Value::Bool(false));
    }

    #[test]
    fn test_hashed_output_names() {
        let table = default_rules(&options(true), &ProjectConfig::default()).unwrap();

        let name = |rule: &str| table.get(rule).unwrap().chain.last().unwrap().options["name"].clone();
        assert_eq!(name("styles"), Value::from("[contenthash].css"));
        assert_eq!(name("images"), Value::from("[contenthash].[ext]"));
        assert_eq!(name("markup"), Value::from("[name].html"));
    }

    #[test]
    fn test_main_stylesheet_scopes_style_rule() {
        let mut config = ProjectConfig::default();
        config.layout.main_stylesheet = Some("src/main.scss".to_string());
        let table = default_rules(&options(false), &config).unwrap();

        assert_eq!(class_of(&table, "/site/src/main.scss"), Some(AssetClass::Style));
        assert_eq!(class_of(&table, "/site/src/widgets/button.scss"), None);
    }

    #[test]
    fn test_extra_template_rule_conflicts_with_defaults() {
        let table = default_rules(&options(false), &ProjectConfig::default()).unwrap();

        let mut builder = RuleTable::builder();
        for rule in table.rules() {
            builder = builder.rule(rule.clone());
        }
        let shadow = PipelineRule::new(
            "shadow",
            AssetClass::Template,
            MatchPattern::extensions(&["jade"]).unwrap(),
        )
        .then(TransformStep::new("pug"));

        assert!(matches!(
            builder.rule(shadow).build(),
            Err(PipelineError::Conflict { .. })
        ));
    }
}
