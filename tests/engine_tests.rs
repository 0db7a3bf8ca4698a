// ABOUTME: Integration tests for engine construction and view rendering
// ABOUTME: Tests engine options, init hooks, globals and the view factory wiring through the service provider

use handlebars::handlebars_helper;
use serde_json::json;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hbs_views::template::{DataStore, Request, TemplateError};
use hbs_views::view::{HandlebarsServiceProvider, ViewError, ViewFactory};

mod common;
use common::TestSite;

fn provider(site: &TestSite) -> HandlebarsServiceProvider {
    HandlebarsServiceProvider::new(
        site.config.clone(),
        site.services(),
        site.request.clone(),
        site.root_path(),
    )
}

#[test]
fn test_templates_path_follows_active_theme() {
    let site = TestSite::new();
    assert_eq!(site.factory().templates_path(), site.templates_path());

    let mut site = TestSite::new();
    site.config.settings =
        hbs_views::Settings::new().with("system.filesystems.themes.root", "site/themes");
    assert_eq!(
        site.factory().templates_path(),
        site.root_path().join("site/themes/default/templates")
    );
}

#[test]
fn test_autoescape_option() {
    let mut site = TestSite::new();
    let data = json!({"html": "<b>bold</b>"});

    assert_eq!(site.render("{{html}}", data.clone()), "<b>bold</b>");

    site.config.handlebars.autoescape = true;
    assert_eq!(site.render("{{html}}", data.clone()), "&lt;b&gt;bold&lt;/b&gt;");
    assert_eq!(site.render("{{{html}}}", data), "<b>bold</b>");
}

#[test]
fn test_strict_variables_option() {
    let mut site = TestSite::new();
    assert_eq!(site.render("[{{missing}}]", json!({})), "[]");

    site.config.handlebars.strict_variables = true;
    assert!(site.try_render("[{{missing}}]", json!({})).is_err());
    assert_eq!(site.render("{{present}}", json!({"present": "yes"})), "yes");
}

#[test]
fn test_dump_only_available_in_debug() {
    let mut site = TestSite::new();
    assert!(site
        .try_render("{{dump title}}", json!({"title": "Hi"}))
        .is_err());

    site.config.handlebars.debug = true;
    assert_eq!(
        site.render("{{dump title}}", json!({"title": "Hi"})),
        "<pre>&quot;Hi&quot;</pre>"
    );

    let dumped = site.render("{{dump}}", json!({"title": "Hi"}));
    assert!(dumped.starts_with("<pre>"));
    assert!(dumped.contains("&quot;title&quot;"));
    assert!(dumped.contains("&quot;request&quot;"));
}

#[test]
fn test_request_is_a_global() {
    let site = TestSite::new();

    assert_eq!(
        site.render("{{request.path}}?page={{request.query.page}}", json!({})),
        "/blog?page=2"
    );
    assert_eq!(site.render("{{request.method}}", json!({})), "GET");
    assert_eq!(
        site.render("{{request.path}}", json!({"request": {"path": "/shadowed"}})),
        "/shadowed"
    );
}

#[test]
fn test_registered_templates_render_by_name() {
    let site = TestSite::new();
    site.write_template("partials/header.html.hbs", "<header>{{title}}</header>");
    site.write_template("home.html.hbs", "<main>{{title}}</main>");
    site.write_template("readme.txt", "not a template");

    let engine = site.engine();
    assert!(engine.registry().has_template("home.html.hbs"));
    assert!(engine.registry().has_template("partials/header.html.hbs"));
    assert!(!engine.registry().has_template("readme.txt"));

    assert_eq!(
        engine.render("home.html.hbs", &json!({"title": "Welcome"})).unwrap(),
        "<main>Welcome</main>"
    );
    assert!(matches!(
        engine.render("missing.html.hbs", &json!({})),
        Err(TemplateError::NotFound(_))
    ));
}

#[test]
fn test_uncached_engine_reloads_templates() {
    let mut site = TestSite::new();
    site.write_template("page.html.hbs", "first");

    let cached = site.engine();
    site.config.handlebars.cache = false;
    let uncached = site.engine();

    site.write_template("page.html.hbs", "second");

    assert_eq!(cached.render("page.html.hbs", &json!({})).unwrap(), "first");
    assert_eq!(uncached.render("page.html.hbs", &json!({})).unwrap(), "second");
}

#[test]
fn test_init_hooks_run_in_order() {
    let site = TestSite::new();
    let provider = provider(&site)
        .on_init(|engine| engine.add_global("greeting", &"first"))
        .on_init(|engine| {
            let previous = engine.globals()["greeting"].as_str().unwrap_or("").to_string();
            engine.add_global("greeting", &format!("{} then second", previous))
        });

    let engine = provider.factory().create().unwrap();
    assert_eq!(
        engine.render_template("{{greeting}}", &json!({})).unwrap(),
        "first then second"
    );
}

#[test]
fn test_init_hook_can_register_partials() {
    let site = TestSite::new();
    let provider = provider(&site).on_init(|engine| {
        engine
            .registry_mut()
            .register_partial("badge", "<span>{{label}}</span>")?;
        Ok(())
    });

    let engine = provider.factory().create().unwrap();
    assert_eq!(
        engine
            .render_template("{{> badge label=\"new\"}}", &json!({}))
            .unwrap(),
        "<span>new</span>"
    );
}

#[test]
fn test_init_hook_registers_custom_helper() {
    handlebars_helper!(shout: |text: str| text.to_uppercase());

    let site = TestSite::new();
    let provider = provider(&site).on_init(|engine| {
        engine.register_helper("shout", shout);
        Ok(())
    });

    let engine = provider.factory().create().unwrap();
    assert_eq!(
        engine
            .render_template("{{shout title}}", &json!({"title": "loud"}))
            .unwrap(),
        "LOUD"
    );
}

#[test]
fn test_init_hook_failure_aborts_creation() {
    let site = TestSite::new();
    let provider = provider(&site)
        .on_init(|_| Err(TemplateError::RenderError("boom".to_string())));

    match provider.factory().create() {
        Err(TemplateError::InitHookError(message)) => assert!(message.contains("boom")),
        other => panic!("expected init hook error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_provider_registers_view_extension() {
    let site = TestSite::new();
    site.write_template("blog/post.html.hbs", "<h1>{{title}}</h1>{{request.path}}");

    let mut views = ViewFactory::new();
    provider(&site).boot(&mut views);

    assert_eq!(views.extensions().collect::<Vec<_>>(), vec!["html.hbs"]);

    let data = DataStore::from_json(json!({"title": "Hello"}));
    assert_eq!(views.make("blog.post", &data).unwrap(), "<h1>Hello</h1>/blog");

    let path = site.templates_path().join("blog/post.html.hbs");
    assert_eq!(views.render(&path, &data).unwrap(), "<h1>Hello</h1>/blog");

    assert!(matches!(
        views.make("blog.missing", &data),
        Err(ViewError::ViewNotFound(_))
    ));
    assert!(matches!(
        views.render(&site.templates_path().join("blog/post.php"), &data),
        Err(ViewError::UnsupportedExtension(_))
    ));
}

#[test]
fn test_views_outside_template_roots_render_from_disk() {
    let site = TestSite::new();
    let elsewhere = site.root_path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    let path = elsewhere.join("standalone.html.hbs");
    fs::write(&path, "Standalone {{name}}").unwrap();

    let mut views = ViewFactory::new();
    provider(&site).boot(&mut views);

    let mut data = DataStore::new();
    data.insert("name", "view");
    assert_eq!(views.render(&path, &data).unwrap(), "Standalone view");
}

#[test]
fn test_engine_is_built_once() {
    let site = TestSite::new();
    site.write_template("page.html.hbs", "{{title}}");

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let provider = provider(&site).on_init(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let mut views = ViewFactory::new();
    provider.boot(&mut views);
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    let data = DataStore::from_json(json!({"title": "Once"}));
    assert_eq!(views.make("page", &data).unwrap(), "Once");
    assert_eq!(views.make("page", &data).unwrap(), "Once");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shared_views_take_request_from_data() {
    let site = TestSite::new();
    site.write_template("page.html.hbs", "{{request.path}}");

    let mut views = ViewFactory::new();
    provider(&site).boot(&mut views);

    assert_eq!(views.make("page", &DataStore::new()).unwrap(), "/blog");

    let mut data = DataStore::new();
    data.insert(
        "request",
        serde_json::to_value(Request::get("https://example.com/about")).unwrap(),
    );
    assert_eq!(views.make("page", &data).unwrap(), "/about");
}

#[test]
fn test_engine_build_errors_surface_through_views() {
    let site = TestSite::new();
    site.write_template("page.html.hbs", "{{title}}");

    let mut views = ViewFactory::new();
    provider(&site)
        .on_init(|_| Err(TemplateError::RenderError("no engine today".to_string())))
        .boot(&mut views);

    assert!(matches!(
        views.make("page", &DataStore::new()),
        Err(ViewError::Template(TemplateError::InitHookError(_)))
    ));
}
