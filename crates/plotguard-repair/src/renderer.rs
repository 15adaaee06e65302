//! Handlebars rendering of generator instructions
//!
//! Custom helpers:
//! - roster: prose list of names, optionally read from a field
//! - cliffhanger_cue: where to cut the final scene for a cliffhanger kind
//! - default: Fallback for null or empty values

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use plotguard_contract::dedupe;
use plotguard_core::{BatchPlan, CliffhangerKind, EpisodeContract};
use serde_json::{json, Value};

use crate::synth::RepairSpec;
use crate::templates::TemplatesFile;
use crate::RenderError;

/// Compiled renderer with registered helpers
pub struct InstructionRenderer {
    handlebars: Handlebars<'static>,
    templates: TemplatesFile,
}

impl InstructionRenderer {
    pub fn new(templates: TemplatesFile) -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // plain text output, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("roster", Box::new(RosterHelper));
        handlebars.register_helper("cliffhanger_cue", Box::new(CliffhangerCueHelper));
        handlebars.register_helper("default", Box::new(DefaultHelper));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| RenderError::Template(format!("{}: {}", name, e)))?;
        }

        Ok(Self { handlebars, templates })
    }

    pub fn builtin() -> Result<Self, RenderError> {
        Self::new(TemplatesFile::builtin()?)
    }

    pub fn load(path: &str) -> Result<Self, RenderError> {
        Self::new(TemplatesFile::load(path)?)
    }

    /// Render a named template with data
    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, RenderError> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| RenderError::Render(e.to_string()))
    }

    pub fn render_batch_instructions(
        &self,
        plan: &BatchPlan,
        contract: &EpisodeContract,
    ) -> Result<String, RenderError> {
        self.render("batch_instructions", &batch_data(plan, contract))
    }

    pub fn render_repair_instructions(&self, spec: &RepairSpec) -> Result<String, RenderError> {
        let mut data = serde_json::to_value(spec).map_err(|e| RenderError::Render(e.to_string()))?;
        if let (Some(map), Some(index)) = (data.as_object_mut(), spec.batch_index) {
            map.insert("batch_number".to_string(), json!(index + 1));
        }
        self.render("repair_instructions", &data)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}

/// Template data for one batch: the plan, with thread, faction and
/// cliffhanger details looked up in the contract.
pub fn batch_data(plan: &BatchPlan, contract: &EpisodeContract) -> Value {
    let threads: Vec<Value> = plan
        .required_threads
        .iter()
        .map(|id| match contract.thread(id) {
            Some(t) => json!({ "id": t.id, "question": t.question, "stake": t.stake }),
            None => json!({ "id": id, "question": "", "stake": "" }),
        })
        .collect();

    let factions: Vec<Value> = plan
        .required_factions
        .iter()
        .map(|name| {
            contract
                .factions_in_play
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name))
                .map(|f| json!(f))
                .unwrap_or_else(|| json!({ "name": name }))
        })
        .collect();

    // the setpiece lands in the middle batch
    let setpiece = if plan.batch_index == plan.batch_count / 2 {
        Some(&contract.setpiece).filter(|s| !s.name.trim().is_empty())
    } else {
        None
    };

    let cliffhanger = plan.cliffhanger.as_ref().filter(|_| plan.must_include_cliffhanger).map(|text| {
        json!({
            "kind": contract.cliffhanger.kind,
            "description": text,
            "open_question": contract.cliffhanger.open_question,
        })
    });

    json!({
        "episode_number": plan.episode_number,
        "title": contract.title,
        "central_conflict": contract.central_conflict,
        "batch_number": plan.batch_index + 1,
        "batch_count": plan.batch_count,
        "scene_count": plan.scene_count,
        "scene_focus": plan.scene_focus,
        "threads": threads,
        "turning_points": plan.required_turning_points,
        "factions": factions,
        "setpiece": setpiece,
        "characters": plan.required_characters,
        "cliffhanger": cliffhanger,
    })
}

// ============================================================================
// Custom Helpers
// ============================================================================

/// `{{roster list}}` or `{{roster list "field"}}`: a prose list of names.
///
/// Items are strings, numbers, or objects read through `field` (a faction's
/// `name`, a scene edit's `scene_number`). Blank and repeated entries are
/// dropped; the last two are joined with "and".
struct RosterHelper;

impl HelperDef for RosterHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let Some(items) = h.param(0).and_then(|v| v.value().as_array()) else {
            return Ok(());
        };
        let field = h.param(1).and_then(|v| v.value().as_str());

        let names = dedupe(items.iter().filter_map(|item| {
            let value = match field {
                Some(field) => item.get(field)?,
                None => item,
            };
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }));
        out.write(&roster(&names))?;
        Ok(())
    }
}

fn roster(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// `{{cliffhanger_cue kind}}`: where to cut the final scene for a
/// cliffhanger kind. Unknown kinds get no cue.
struct CliffhangerCueHelper;

impl HelperDef for CliffhangerCueHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let kind = h
            .param(0)
            .and_then(|v| v.value().as_str())
            .and_then(CliffhangerKind::parse)
            .unwrap_or_default();
        out.write(cliffhanger_cue(kind))?;
        Ok(())
    }
}

fn cliffhanger_cue(kind: CliffhangerKind) -> &'static str {
    match kind {
        CliffhangerKind::Revelation => "Cut on the reveal itself, before anyone reacts.",
        CliffhangerKind::Danger => "Cut while the threat is still unresolved.",
        CliffhangerKind::Decision => "Cut at the moment of choice, before it is made.",
        CliffhangerKind::Arrival => "Cut as the newcomer is seen, before they speak.",
        CliffhangerKind::Betrayal => "Cut when the audience sees the betrayal and the victim does not.",
        CliffhangerKind::Unknown => "",
    }
}

/// Default value helper; empty strings count as missing
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h.param(0).map(|v| v.value());
        let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

        match value {
            Some(Value::Null) | None => out.write(default)?,
            Some(Value::String(s)) if s.trim().is_empty() => out.write(default)?,
            Some(Value::String(s)) => out.write(s)?,
            Some(v) => out.write(&v.to_string())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer_with(template: &str) -> InstructionRenderer {
        let yaml = format!(
            "version: \"1.0\"\ntemplates:\n  batch_instructions:\n    template: {:?}\n  repair_instructions:\n    template: \"\"\n",
            template
        );
        InstructionRenderer::new(TemplatesFile::from_yaml(&yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_roster_of_names() {
        let renderer = renderer_with("Cast: {{roster names}}.");
        let render = |names: Value| renderer.render("batch_instructions", &json!({ "names": names })).unwrap();
        assert_eq!(render(json!(["Marta"])), "Cast: Marta.");
        assert_eq!(render(json!(["Marta", "Leo"])), "Cast: Marta and Leo.");
        assert_eq!(render(json!(["Marta", " ", "Leo", "MARTA", "Tito"])), "Cast: Marta, Leo and Tito.");
        assert_eq!(render(json!([])), "Cast: .");
    }

    #[test]
    fn test_roster_reads_a_field() {
        let renderer = renderer_with("Scenes {{roster scene_edits \"scene_number\"}}");
        let data = json!({
            "scene_edits": [
                { "scene_index": 0, "scene_number": 10, "directives": [] },
                { "scene_index": 2, "scene_number": 12, "directives": [] }
            ]
        });
        assert_eq!(renderer.render("batch_instructions", &data).unwrap(), "Scenes 10 and 12");
    }

    #[test]
    fn test_default_helper_treats_blank_as_missing() {
        let renderer = renderer_with("{{default q \"none\"}}|{{default missing \"none\"}}|{{default n \"x\"}}");
        let out = renderer.render("batch_instructions", &json!({ "q": "  ", "n": 3 })).unwrap();
        assert_eq!(out, "none|none|3");
    }

    #[test]
    fn test_cliffhanger_cue_per_kind() {
        let renderer = renderer_with("[{{cliffhanger_cue kind}}]");
        let cue = |kind: &str| renderer.render("batch_instructions", &json!({ "kind": kind })).unwrap();
        assert_eq!(cue("danger"), "[Cut while the threat is still unresolved.]");
        assert_eq!(cue("Revelación"), "[Cut on the reveal itself, before anyone reacts.]");
        assert_eq!(cue("unknown"), "[]");
        assert_eq!(cue("twist"), "[]");
    }

    #[test]
    fn test_no_html_escaping() {
        let renderer = renderer_with("{{text}}");
        let out = renderer.render("batch_instructions", &json!({ "text": "father's <deed> & \"will\"" })).unwrap();
        assert_eq!(out, "father's <deed> & \"will\"");
    }

    #[test]
    fn test_invalid_template_is_an_error() {
        let yaml = "version: \"1.0\"\ntemplates:\n  batch_instructions:\n    template: \"{{#if x}}\"\n  repair_instructions:\n    template: \"\"\n";
        let result = InstructionRenderer::new(TemplatesFile::from_yaml(yaml).unwrap());
        assert!(matches!(result, Err(RenderError::Template(_))));
    }
}
