// ABOUTME: Handlebars helper bindings for the template function library
// ABOUTME: Maps positional and hash arguments onto template functions and registers them with the registry

use handlebars::{
    Context, Handlebars, Helper, HelperDef, Output, RenderContext, RenderError, ScopedJson,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use super::error::{Result, TemplateError};
use super::functions::{parse_timestamp, CollectionNames, CollectionQuery, GlideOptions, TemplateFunctions};
use crate::imaging::Manipulation;

/// Arguments of a helper call; each argument may be given by position or by name.
#[derive(Debug, Clone, Default)]
pub struct Args {
    function: &'static str,
    positional: Vec<JsonValue>,
    named: Map<String, JsonValue>,
}

impl Args {
    pub fn new(function: &'static str, positional: Vec<JsonValue>, named: Map<String, JsonValue>) -> Self {
        Self {
            function,
            positional,
            named,
        }
    }

    fn from_helper(function: &'static str, h: &Helper) -> Self {
        let positional = h.params().iter().map(|p| p.value().clone()).collect();
        let named = h
            .hash()
            .iter()
            .map(|(key, value)| (key.to_string(), value.value().clone()))
            .collect();
        Self::new(function, positional, named)
    }

    /// Named argument first, then positional; null counts as absent
    pub fn get(&self, index: usize, name: &str) -> Option<&JsonValue> {
        self.named
            .get(name)
            .or_else(|| self.positional.get(index))
            .filter(|value| !value.is_null())
    }

    /// Like [`Args::get`], also treating empty strings and `false` as absent
    pub fn present(&self, index: usize, name: &str) -> Option<&JsonValue> {
        self.get(index, name).filter(|value| match value {
            JsonValue::String(s) => !s.is_empty(),
            JsonValue::Bool(b) => *b,
            _ => true,
        })
    }

    pub fn string(&self, index: usize, name: &str) -> Option<String> {
        self.present(index, name).map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn required_string(&self, index: usize, name: &str) -> Result<String> {
        self.string(index, name).ok_or_else(|| {
            TemplateError::invalid_argument(self.function, format!("missing required argument '{}'", name))
        })
    }

    pub fn bool(&self, index: usize, name: &str, default: bool) -> bool {
        match self.get(index, name) {
            None => default,
            Some(JsonValue::Bool(b)) => *b,
            Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(JsonValue::String(s)) => !matches!(s.as_str(), "" | "0" | "false"),
            Some(JsonValue::Array(items)) => !items.is_empty(),
            Some(JsonValue::Object(map)) => !map.is_empty(),
            Some(JsonValue::Null) => default,
        }
    }

    /// Non-negative integer given as a number or numeric string
    pub fn unsigned(&self, index: usize, name: &str) -> Result<Option<u64>> {
        let value = match self.present(index, name) {
            Some(value) => value,
            None => return Ok(None),
        };

        let parsed = match value {
            JsonValue::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            JsonValue::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        parsed.map(Some).ok_or_else(|| {
            TemplateError::invalid_argument(
                self.function,
                format!("'{}' must be a non-negative integer, got {}", name, value),
            )
        })
    }

    fn dimension(&self, index: usize, name: &str) -> Result<Option<u32>> {
        self.unsigned(index, name)?
            .map(|value| {
                u32::try_from(value).map_err(|_| {
                    TemplateError::invalid_argument(self.function, format!("'{}' is out of range", name))
                })
            })
            .transpose()
    }
}

/// Wraps a template function so it can be called directly or as a subexpression.
struct FunctionHelper<F> {
    name: &'static str,
    func: F,
}

impl<F> HelperDef for FunctionHelper<F>
where
    F: Fn(&Args) -> Result<JsonValue> + Send + Sync,
{
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'reg, 'rc>, RenderError> {
        let args = Args::from_helper(self.name, h);
        let value = (self.func)(&args)
            .map_err(|e| RenderError::new(format!("{} failed: {}", self.name, e)))?;
        Ok(ScopedJson::Derived(value))
    }
}

fn register_function<F>(handlebars: &mut Handlebars<'static>, name: &'static str, func: F)
where
    F: Fn(&Args) -> Result<JsonValue> + Send + Sync + 'static,
{
    handlebars.register_helper(name, Box::new(FunctionHelper { name, func }));
}

/// Build glide options from helper arguments
pub fn glide_options(args: &Args) -> Result<GlideOptions> {
    let mut manipulation = Manipulation::new();

    if let Some(width) = args.dimension(1, "width")? {
        manipulation = manipulation.width(width);
    }
    if let Some(height) = args.dimension(2, "height")? {
        manipulation = manipulation.height(height);
    }
    if let Some(square) = args.dimension(3, "square")? {
        manipulation = manipulation.square(square);
    }
    if let Some(fit) = args.string(4, "fit") {
        manipulation = manipulation.fit(&fit);
    }
    if let Some(crop) = args.string(5, "crop") {
        manipulation = manipulation.crop(&crop);
    }
    if let Some(orient) = args.string(6, "orient") {
        manipulation = manipulation.orient(&orient);
    }
    if let Some(quality) = args.dimension(7, "quality")? {
        manipulation = manipulation.quality(quality);
    }
    if let Some(format) = args.string(8, "format") {
        manipulation = manipulation.format(&format);
    }
    if let Some(preset) = args.string(9, "preset") {
        manipulation = manipulation.preset(&preset);
    }

    Ok(GlideOptions {
        manipulation,
        absolute: args.bool(10, "absolute", false),
    })
}

/// Build a collection query from helper arguments
pub fn collection_query(args: &Args) -> Result<CollectionQuery> {
    let names = args.get(0, "name").and_then(CollectionNames::from_json);
    let mut query = CollectionQuery::new(names);

    query.show_unpublished = args.bool(1, "show_unpublished", false);
    query.show_published = args.bool(2, "show_published", true);
    query.show_future = args.bool(3, "show_future", false);
    query.show_past = args.bool(4, "show_past", true);
    query.since = args.present(5, "since").map(parse_timestamp).transpose()?;
    query.until = args.present(6, "until").map(parse_timestamp).transpose()?;
    query.sort = args.string(7, "sort");
    query.limit = args.unsigned(8, "limit")?.map(|limit| limit as usize);
    query.offset = args.unsigned(9, "offset")?.unwrap_or(0) as usize;
    query.locale = args.string(10, "locale");
    query.conditions = args.string(11, "conditions");

    Ok(query)
}

/// Register the function library with a Handlebars instance
pub fn register_functions(handlebars: &mut Handlebars<'static>, functions: Arc<TemplateFunctions>) {
    let f = functions.clone();
    register_function(handlebars, "get_asset", move |args| {
        Ok(f.get_asset(&args.required_string(0, "id")?))
    });

    let f = functions.clone();
    register_function(handlebars, "get_entry", move |args| {
        Ok(f.get_entry(&args.required_string(0, "id")?))
    });

    let f = functions.clone();
    register_function(handlebars, "get_page", move |args| {
        Ok(f.get_page(&args.required_string(0, "id")?))
    });

    let f = functions.clone();
    register_function(handlebars, "get_content", move |args| {
        Ok(f.get_content(&args.required_string(0, "id")?))
    });

    let f = functions.clone();
    register_function(handlebars, "collection", move |args| {
        let query = collection_query(args)?;
        Ok(JsonValue::Array(f.collection(&query)?))
    });

    let f = functions.clone();
    register_function(handlebars, "glide", move |args| {
        let item = args.get(0, "item").cloned().unwrap_or(JsonValue::Null);
        let options = match glide_options(args) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!("Ignoring glide call with invalid options: {}", e);
                return Ok(JsonValue::String(String::new()));
            }
        };
        Ok(JsonValue::String(f.glide(&item, &options)))
    });

    let f = functions.clone();
    register_function(handlebars, "theme", move |args| {
        let file = args.required_string(0, "file")?;
        let url = f.theme(
            &file,
            args.bool(1, "cache_bust", false),
            args.bool(2, "absolute", true),
        )?;
        Ok(JsonValue::String(url))
    });

    let f = functions;
    register_function(handlebars, "env", move |args| {
        let name = args.required_string(0, "name")?;
        let default = args.get(1, "default").cloned().unwrap_or(JsonValue::Null);
        Ok(f.env(&name, default))
    });
}

/// Dump helper - prints a value, or the whole context, as pretty JSON
pub fn dump_helper(
    h: &Helper,
    _: &Handlebars,
    ctx: &Context,
    _rc: &mut RenderContext,
    out: &mut dyn Output,
) -> std::result::Result<(), RenderError> {
    let value = match h.param(0) {
        Some(param) => param.value(),
        None => ctx.data(),
    };

    let dumped = serde_json::to_string_pretty(value)
        .map_err(|e| RenderError::new(format!("dump failed: {}", e)))?;

    out.write("<pre>")?;
    out.write(&handlebars::html_escape(&dumped))?;
    out.write("</pre>")?;
    Ok(())
}

/// Register the debug-only helpers
pub fn register_debug_helpers(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper("dump", Box::new(dump_helper));
}
