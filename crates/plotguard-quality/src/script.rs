//! Whole-script validation against the episode contract
//!
//! Runs after all batches are assembled. Each check scores a narrative
//! obligation from the contract by fuzzy matching against the script
//! corpus (synopsis plus every scene's text).

use crate::findings::{percent, Findings};
use crate::profile::{QcProfile, ScriptRules};
use plotguard_contract::{cliffhanger_keywords, MatchCorpus, DEFAULT_THRESHOLD};
use plotguard_core::{EpisodeContract, Scene, Script};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptQuality {
    Excellent,
    Good,
    Acceptable,
    Poor,
    Failed,
}

impl fmt::Display for ScriptQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Poor => "poor",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub expected: usize,
    pub found: usize,
    pub ratio: f64,
    pub missing: Vec<String>,
}

impl CoverageReport {
    fn from_checks(checks: Vec<(String, bool)>) -> Self {
        let expected = checks.len();
        let missing: Vec<String> = checks
            .into_iter()
            .filter(|(_, found)| !found)
            .map(|(name, _)| name)
            .collect();
        let found = expected - missing.len();
        let ratio = if expected == 0 { 1.0 } else { found as f64 / expected as f64 };
        Self { expected, found, ratio, missing }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurningPointCoverage {
    pub expected: usize,
    pub executed: usize,
    /// Ids of turning points not found in the script
    pub missing: Vec<String>,
    /// Ids of executed turning points whose consequence is not shown
    pub consequences_missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliffhangerMatch {
    pub present: bool,
    /// 0-100: description +50, type keyword +30, substantial scene +20
    pub score: u32,
    pub description_matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetpieceExecution {
    pub name_found: bool,
    pub participants_present: Vec<String>,
    pub participants_missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDepthIssue {
    /// 0-based position in the script
    pub scene_index: usize,
    pub scene_number: u32,
    pub reasons: Vec<String>,
}

/// Script QC verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptQcResult {
    pub passed: bool,
    pub score: u32,
    pub quality: ScriptQuality,
    pub thread_coverage: CoverageReport,
    pub turning_point_coverage: TurningPointCoverage,
    pub cliffhanger_match: CliffhangerMatch,
    pub character_coverage: CoverageReport,
    pub setpiece_execution: SetpieceExecution,
    pub red_line_violations: Vec<String>,
    pub scene_depth_issues: Vec<SceneDepthIssue>,
    pub blockers: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn validate_script(script: &Script, contract: &EpisodeContract) -> ScriptQcResult {
    validate_script_with_profile(script, contract, &QcProfile::standard())
}

pub fn validate_script_with_profile(
    script: &Script,
    contract: &EpisodeContract,
    profile: &QcProfile,
) -> ScriptQcResult {
    let rules = &profile.script;
    let corpus = MatchCorpus::new(&script.corpus());
    let mut findings = Findings::new();

    let thread_coverage = check_threads(&corpus, contract, rules, &mut findings);
    let turning_point_coverage = check_turning_points(&corpus, contract, rules, &mut findings);
    let cliffhanger_match = check_cliffhanger(script, contract, rules, &mut findings);
    let character_coverage = check_characters(&corpus, contract, rules, &mut findings);
    let setpiece_execution = check_setpiece(&corpus, contract, rules, &mut findings);
    let red_line_violations = check_red_lines(&corpus, contract, rules, &mut findings);
    let scene_depth_issues = check_scene_depth(&script.scenes, rules, &mut findings);

    let score = findings.score();
    let quality = tier(score, findings.has_blockers(), rules);
    let result = ScriptQcResult {
        passed: !findings.has_blockers(),
        score,
        quality,
        thread_coverage,
        turning_point_coverage,
        cliffhanger_match,
        character_coverage,
        setpiece_execution,
        red_line_violations,
        scene_depth_issues,
        blockers: findings.blockers(),
        warnings: findings.warnings(),
    };

    if result.passed {
        info!(episode = contract.episode_number, score, %quality, "script QC passed");
    } else {
        warn!(
            episode = contract.episode_number,
            score,
            %quality,
            blockers = ?result.blockers,
            "script QC failed"
        );
    }
    result
}

fn tier(score: u32, has_blockers: bool, rules: &ScriptRules) -> ScriptQuality {
    if has_blockers {
        return if score >= rules.poor_floor { ScriptQuality::Poor } else { ScriptQuality::Failed };
    }
    if score >= rules.excellent_score {
        ScriptQuality::Excellent
    } else if score >= rules.good_score {
        ScriptQuality::Good
    } else if score >= rules.acceptable_score {
        ScriptQuality::Acceptable
    } else {
        ScriptQuality::Poor
    }
}

// ============================================================================
// Checks
// ============================================================================

fn check_threads(
    corpus: &MatchCorpus,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> CoverageReport {
    let checks = contract
        .threads_required
        .iter()
        .map(|thread| {
            let mentions = corpus.count_mentions(&thread.id.replace('_', " "));
            let found = mentions >= rules.thread_min_mentions
                || (!thread.question.trim().is_empty()
                    && corpus.contains(&thread.question, rules.thread_question_threshold));
            (thread.id.clone(), found)
        })
        .collect();
    let coverage = CoverageReport::from_checks(checks);

    if coverage.expected > 0 {
        let code = format!("THREADS:coverage_{}%", percent(coverage.ratio));
        if coverage.ratio < rules.thread_block_below {
            findings.blocker(code, rules.thread_block_weight);
        } else if coverage.ratio < rules.thread_warn_below {
            findings.warning(code, rules.thread_warn_weight);
        }
    }
    coverage
}

fn check_turning_points(
    corpus: &MatchCorpus,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> TurningPointCoverage {
    let mut coverage = TurningPointCoverage {
        expected: contract.turning_points.len(),
        ..Default::default()
    };

    for tp in &contract.turning_points {
        let agent_found = tp.has_placeholder_agent() || corpus.contains(&tp.agent, DEFAULT_THRESHOLD);
        let event_found = corpus.contains(&tp.event, rules.event_threshold);
        if !(agent_found && event_found) {
            coverage.missing.push(tp.id.clone());
            continue;
        }
        coverage.executed += 1;
        if !tp.consequence.trim().is_empty()
            && !corpus.contains(&tp.consequence, rules.consequence_threshold)
        {
            coverage.consequences_missing.push(tp.id.clone());
            findings.warning(
                format!("TURNING_POINTS:{}_consequence_missing", tp.id),
                rules.consequence_weight,
            );
        }
    }

    if !coverage.missing.is_empty() {
        findings.blocker(
            format!("TURNING_POINTS:{}/{}_sin_ejecutar", coverage.missing.len(), coverage.expected),
            rules.turning_point_weight,
        );
    }
    coverage
}

/// Only the final scene can land the cliffhanger.
fn check_cliffhanger(
    script: &Script,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> CliffhangerMatch {
    if !contract.has_cliffhanger() {
        return CliffhangerMatch::default();
    }

    let final_text = script.scenes.last().map(Scene::combined_text).unwrap_or_default();
    let scene = MatchCorpus::new(&final_text);

    let description_matched = scene.contains(&contract.cliffhanger.description, rules.cliffhanger_threshold);
    let keyword = scene.contains_any(&cliffhanger_keywords(contract.cliffhanger.kind));
    let substantial = final_text.trim().chars().count() > rules.cliffhanger_min_chars;

    let mut score = 0;
    if description_matched {
        score += 50;
    }
    if keyword.is_some() {
        score += 30;
    }
    if substantial {
        score += 20;
    }
    let present = score >= rules.cliffhanger_present_score;

    if !present {
        findings.blocker("CLIFFHANGER: no detectado", rules.cliffhanger_weight);
    } else if keyword.is_none() {
        findings.warning(
            format!("CLIFFHANGER:no_{}_keyword", contract.cliffhanger.kind),
            rules.cliffhanger_keyword_weight,
        );
    }

    CliffhangerMatch { present, score, description_matched, keyword }
}

fn check_characters(
    corpus: &MatchCorpus,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> CoverageReport {
    let checks = contract
        .characters_required
        .iter()
        .map(|name| (name.clone(), corpus.contains(name, DEFAULT_THRESHOLD)))
        .collect();
    let coverage = CoverageReport::from_checks(checks);

    if coverage.ratio < rules.character_warn_below {
        findings.warning(
            format!("CHARACTERS:coverage_{}%", percent(coverage.ratio)),
            rules.character_low_weight,
        );
    } else if !coverage.missing.is_empty() {
        findings.warning(
            format!("CHARACTERS:missing({})", coverage.missing.join(",")),
            rules.character_missing_weight,
        );
    }
    coverage
}

fn check_setpiece(
    corpus: &MatchCorpus,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> SetpieceExecution {
    let setpiece = &contract.setpiece;
    if setpiece.name.trim().is_empty() {
        return SetpieceExecution::default();
    }

    let (participants_present, participants_missing) = setpiece
        .participants
        .iter()
        .cloned()
        .partition(|p| corpus.contains(p, DEFAULT_THRESHOLD));
    let name_found = corpus.contains(&setpiece.name, DEFAULT_THRESHOLD);
    if !name_found {
        findings.warning(format!("SETPIECE:not_found({})", setpiece.name), rules.setpiece_weight);
    }

    SetpieceExecution { name_found, participants_present, participants_missing }
}

fn check_red_lines(
    corpus: &MatchCorpus,
    contract: &EpisodeContract,
    rules: &ScriptRules,
    findings: &mut Findings,
) -> Vec<String> {
    let mut violations = Vec::new();
    for faction in &contract.factions_in_play {
        if faction.red_line.trim().is_empty() {
            continue;
        }
        if corpus.contains(&faction.red_line, rules.red_line_threshold) {
            findings.warning(format!("RED_LINE:{}", faction.name), rules.red_line_weight);
            violations.push(faction.name.clone());
        }
    }
    violations
}

fn check_scene_depth(scenes: &[Scene], rules: &ScriptRules, findings: &mut Findings) -> Vec<SceneDepthIssue> {
    let issues: Vec<SceneDepthIssue> = scenes
        .iter()
        .enumerate()
        .filter_map(|(index, scene)| {
            let reasons = depth_reasons(scene, rules);
            (!reasons.is_empty()).then(|| SceneDepthIssue {
                scene_index: index,
                scene_number: scene.scene_number,
                reasons,
            })
        })
        .collect();

    if !scenes.is_empty() {
        let ratio = issues.len() as f64 / scenes.len() as f64;
        let code = format!("SCENE_DEPTH:{}/{}", issues.len(), scenes.len());
        if ratio > rules.depth_block_above {
            findings.blocker(code, rules.depth_block_weight);
        } else if ratio >= rules.depth_warn_from {
            findings.warning(code, rules.depth_warn_weight);
        }
    }
    issues
}

fn depth_reasons(scene: &Scene, rules: &ScriptRules) -> Vec<String> {
    let mut reasons = Vec::new();

    let raw_len = scene.raw_content.trim().chars().count();
    if raw_len < rules.min_raw_chars {
        reasons.push(format!("raw_content_short({})", raw_len));
    }
    let action_len = scene.action_summary.trim().chars().count();
    if action_len < rules.min_action_chars {
        reasons.push(format!("action_summary_short({})", action_len));
    }

    let text = format!("{}\n{}", scene.action_summary, scene.raw_content).to_lowercase();
    if let Some(placeholder) = rules
        .placeholders
        .iter()
        .find(|p| !p.is_empty() && text.contains(&p.to_lowercase()))
    {
        reasons.push(format!("placeholder({})", placeholder));
    }
    reasons
}
