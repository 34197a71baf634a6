//! Integration tests for view rendering
//!
//! These tests render view trees built through the factory with in-memory
//! fragment themes, covering hierarchy fallback, parent rendering, theme
//! inheritance and variable scoping.

use std::rc::Rc;

use tessera::{
    BlockError, BlockFactory, BlockRegistry, BlockType, BlockView, LazyExtension, Map,
    PreloadedExtension, Result, Value, builtin,
    config::AppConfig,
    options,
    render::{BlockRenderer, FragmentContext, FragmentThemes, ThemeEngine},
};

struct ChoiceType;

impl BlockType for ChoiceType {
    fn name(&self) -> &str {
        "choice"
    }

    fn parent(&self) -> Option<&str> {
        Some(builtin::BLOCK_TYPE)
    }
}

fn factory() -> BlockFactory {
    let registry = BlockRegistry::builder()
        .with_extension(LazyExtension::new(builtin::CoreExtension))
        .with_extension(PreloadedExtension::default().with_type(Rc::new(ChoiceType)))
        .build()
        .unwrap();
    BlockFactory::new(registry)
}

fn block_row(ctx: &FragmentContext<'_>) -> Result<String> {
    let label = ctx.search_and_render(ctx.view(), "label", Map::new())?;
    let widget = ctx.search_and_render(ctx.view(), "widget", Map::new())?;
    Ok(format!("<div>{label}{widget}</div>"))
}

fn block_label(ctx: &FragmentContext<'_>) -> Result<String> {
    let text = match ctx.var("label") {
        Value::String(label) => label.clone(),
        _ => ctx
            .renderer()
            .humanize(ctx.var("name").as_str().unwrap_or_default()),
    };
    Ok(format!("<label for=\"{}\">{text}</label>", ctx.var("id")))
}

fn block_widget(ctx: &FragmentContext<'_>) -> Result<String> {
    if ctx.var("compound").is_truthy() {
        let mut rows = String::new();
        for child in ctx.view().children() {
            rows.push_str(&ctx.search_and_render(&child, "row", Map::new())?);
        }
        return Ok(format!("<fieldset id=\"{}\">{rows}</fieldset>", ctx.var("id")));
    }
    Ok(format!(
        "<input type=\"{}\" name=\"{}\" value=\"{}\">",
        ctx.var("type").as_str().unwrap_or("hidden"),
        ctx.var("full_name"),
        ctx.var("value")
    ))
}

fn text_widget(ctx: &FragmentContext<'_>) -> Result<String> {
    ctx.render_parent(options! { "type" => "text" })
}

fn block_attributes(ctx: &FragmentContext<'_>) -> Result<String> {
    Ok(ctx.var("attr").to_string())
}

fn base_themes() -> FragmentThemes {
    FragmentThemes::new()
        .with_fragment("base", "block_row", block_row)
        .with_fragment("base", "block_label", block_label)
        .with_fragment("base", "block_widget", block_widget)
        .with_fragment("base", "text_widget", text_widget)
        .with_fragment("base", "block_attributes", block_attributes)
}

fn profile_view(factory: &BlockFactory) -> BlockView {
    let mut builder = factory
        .create_named_builder("form", builtin::BLOCK_TYPE, Value::Null, options! {})
        .unwrap();
    builder
        .add_named(Some("email"), None, options! { "attr" => options! { "class" => "wide" } })
        .unwrap()
        .add_named(Some("first_name"), None, options! { "label" => "Given name" })
        .unwrap();
    let block = builder.get_block().unwrap();
    block
        .set_data(options! { "email" => "ada@example.com", "first_name" => "Ada" })
        .unwrap();
    block.create_view(None).unwrap()
}

#[test]
fn test_fragment_falls_back_to_parent_type() {
    let factory = factory();
    let view = factory
        .create("choice", Value::Null, options! {})
        .unwrap()
        .create_view(None)
        .unwrap();
    assert_eq!(
        view.var("block_prefixes"),
        Some(Value::from(vec!["block", "choice", "_choice"]))
    );

    let themes = FragmentThemes::new().with_fragment(
        "minimal",
        "block_widget",
        |ctx: &FragmentContext<'_>| -> Result<String> { Ok(format!("widget:{}", ctx.var("id"))) },
    );
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(themes, vec!["minimal".to_owned()]));

    assert_eq!(
        renderer.search_and_render_block(&view, "widget", Map::new()).unwrap(),
        "widget:choice"
    );
    assert!(view.is_rendered());
    assert_eq!(renderer.search_and_render_block(&view, "widget", Map::new()).unwrap(), "");
}

#[test]
fn test_missing_fragment_lists_searched_blocks() {
    let factory = factory();
    let view = factory
        .create("choice", Value::Null, options! {})
        .unwrap()
        .create_view(None)
        .unwrap();
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(base_themes(), vec!["base".to_owned()]));

    let err = renderer
        .search_and_render_block(&view, "help", Map::new())
        .unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));
    assert_eq!(
        err.to_string(),
        "Unable to render the block as none of the following blocks exist: \
         \"_choice_help\", \"choice_help\", \"block_help\"."
    );
}

#[test]
fn test_render_view_tree() {
    let factory = factory();
    let view = profile_view(&factory);
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(base_themes(), vec!["base".to_owned()]));

    let html = renderer.search_and_render_block(&view, "row", Map::new()).unwrap();
    assert_eq!(
        html,
        "<div><label for=\"form\">Form</label><fieldset id=\"form\">\
         <div><label for=\"form_email\">Email</label>\
         <input type=\"text\" name=\"form[email]\" value=\"ada@example.com\"></div>\
         <div><label for=\"form_first_name\">Given name</label>\
         <input type=\"text\" name=\"form[first_name]\" value=\"Ada\"></div>\
         </fieldset></div>"
    );
    assert!(view.children().iter().all(BlockView::is_rendered));
    assert_eq!(renderer.search_and_render_block(&view, "row", Map::new()).unwrap(), "");
}

#[test]
fn test_view_theme_applies_to_descendants() {
    let factory = factory();
    let view = profile_view(&factory);
    let mut themes = base_themes();
    themes.add_fragment(
        "custom",
        "_form_email_label",
        |_ctx: &FragmentContext<'_>| -> Result<String> { Ok("<label class=\"custom\">E-mail</label>".to_owned()) },
    );
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(themes, vec!["base".to_owned()]));
    renderer.set_theme(&view, vec!["custom".to_owned()], true).unwrap();

    let email = view.child("email").unwrap();
    assert_eq!(
        renderer.search_and_render_block(&email, "row", Map::new()).unwrap(),
        "<div><label class=\"custom\">E-mail</label>\
         <input type=\"text\" name=\"form[email]\" value=\"ada@example.com\"></div>"
    );

    let first_name = view.child("first_name").unwrap();
    assert_eq!(
        renderer.search_and_render_block(&first_name, "label", Map::new()).unwrap(),
        "<label for=\"form_first_name\">Given name</label>"
    );
}

#[test]
fn test_view_theme_can_drop_default_themes() {
    let factory = factory();
    let view = profile_view(&factory);
    let themes = base_themes().with_fragment(
        "bare",
        "block_label",
        |_ctx: &FragmentContext<'_>| -> Result<String> { Ok("bare".to_owned()) },
    );
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(themes, vec!["base".to_owned()]));
    renderer.set_theme(&view, vec!["bare".to_owned()], false).unwrap();

    assert_eq!(renderer.search_and_render_block(&view, "label", Map::new()).unwrap(), "bare");
    assert!(renderer.search_and_render_block(&view, "widget", Map::new()).is_err());
}

#[test]
fn test_passed_attributes_are_merged() {
    let factory = factory();
    let view = profile_view(&factory);
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(base_themes(), vec!["base".to_owned()]));
    let email = view.child("email").unwrap();

    let html = renderer
        .render_block(
            &email,
            "block_attributes",
            options! { "attr" => options! { "data-x" => "1" } },
        )
        .unwrap();
    assert_eq!(html, "{class: wide, data-x: 1}");
}

#[test]
fn test_render_block_by_name_overrides_variables() {
    let factory = factory();
    let view = profile_view(&factory);
    let renderer = BlockRenderer::new(ThemeEngine::with_default_themes(base_themes(), vec!["base".to_owned()]));

    let html = renderer
        .render_block(&view, "block_label", options! { "label" => "Profile" })
        .unwrap();
    assert_eq!(html, "<label for=\"form\">Profile</label>");

    let err = renderer
        .render_block(&view, "missing_block", Map::new())
        .unwrap_err();
    assert!(matches!(err, BlockError::Logic(_)));
}

#[test]
fn test_unknown_theme_is_reported() {
    let factory = factory();
    let view = profile_view(&factory);
    let renderer = BlockRenderer::new(ThemeEngine::new(base_themes()));
    renderer.set_theme(&view, vec!["missing".to_owned()], true).unwrap();

    let err = renderer
        .search_and_render_block(&view, "label", Map::new())
        .unwrap_err();
    assert!(matches!(err, BlockError::InvalidArgument(_)));
}

#[test]
fn test_default_themes_from_config() {
    let config = AppConfig::from_toml_str(
        r#"
        [renderer]
        default_themes = ["base"]
        "#,
    )
    .unwrap();
    let engine = ThemeEngine::from_config(base_themes(), config.renderer());
    assert_eq!(engine.default_themes(), ["base"]);

    let factory = factory();
    let view = profile_view(&factory);
    let renderer = BlockRenderer::new(engine);
    let first_name = view.child("first_name").unwrap();
    assert_eq!(
        renderer.search_and_render_block(&first_name, "widget", Map::new()).unwrap(),
        "<input type=\"text\" name=\"form[first_name]\" value=\"Ada\">"
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = AppConfig::from_toml_str("[renderer]\ndefault_themes = 3").unwrap_err();
    assert!(matches!(err, BlockError::Config(_)));
}
