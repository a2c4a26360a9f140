//! One activation pass: match, decide, enhance, build the report.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{FALLBACK_MIN_PROMPT_CHARS, MIN_ENHANCE_PROMPT_CHARS, REWRITE_TIMEOUT};
use crate::error::Result;
use crate::input::HookInput;
use crate::matcher::{
    classify, match_candidates, match_enhancements, Candidate, EnhancementMatch, MatchType,
    Recommendation, RuleMatcher, SkillMatch,
};
use crate::report::{collect_suggestions, ActivationReport, Report};
use crate::rewriter::{PromptRewriter, RewriteRequest};
use crate::rules::{EnhancementRules, LoadedRules};

/// Markers a rewritten prompt may carry so it is not processed again
const SKIP_MARKERS: [&str; 2] = ["[enhanced]", "__skip_enhance__"];

/// Whether this run may act at all.
///
/// `Suppressed` is set by the caller when the run happens inside a rewriter
/// call; a suppressed run produces nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnhanceGuard {
    #[default]
    Allowed,
    Suppressed,
}

impl EnhanceGuard {
    pub fn from_flag(suppressed: bool) -> Self {
        if suppressed {
            EnhanceGuard::Suppressed
        } else {
            EnhanceGuard::Allowed
        }
    }

    /// True when the guard is set or the prompt carries a skip marker.
    pub fn suppresses(&self, prompt: &str) -> bool {
        if *self == EnhanceGuard::Suppressed {
            return true;
        }
        let lower = prompt.to_lowercase();
        SKIP_MARKERS.iter().any(|marker| lower.contains(marker))
    }
}

/// Per-run knobs.
#[derive(Clone, Copy)]
pub struct RunOptions<'a> {
    pub guard: EnhanceGuard,
    /// Add TF-IDF related skills to the report
    pub tfidf: bool,
    /// `None` disables enhancement
    pub rewriter: Option<&'a dyn PromptRewriter>,
    pub timeout: Duration,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            guard: EnhanceGuard::Allowed,
            tfidf: false,
            rewriter: None,
            timeout: REWRITE_TIMEOUT,
        }
    }
}

/// Everything one pass decided.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub skills: Vec<SkillMatch>,
    pub related: Vec<SkillMatch>,
    pub enhancements: Vec<EnhancementMatch>,
    pub recommendation: Option<Recommendation>,
    pub enhanced_prompt: Option<String>,
    /// `None` means print nothing
    pub report: Option<Report>,
}

/// Compiled rule set ready to evaluate prompts.
#[derive(Debug, Clone)]
pub struct Activation {
    matcher: RuleMatcher,
    candidates: Vec<Candidate>,
    enhancement: Option<EnhancementRules>,
}

impl Activation {
    /// Compile loaded rules. Fails on any invalid intent pattern.
    pub fn new(rules: &LoadedRules) -> Result<Self> {
        let matcher = RuleMatcher::compile(&rules.skills)?;

        let candidates = rules
            .skills
            .skills
            .iter()
            .map(|(name, rule)| {
                let keywords = rule
                    .prompt_triggers
                    .as_ref()
                    .map(|t| t.keywords.clone())
                    .unwrap_or_default();
                Candidate::new(name.clone(), rule.description.clone()).with_keywords(keywords)
            })
            .collect();

        Ok(Self {
            matcher,
            candidates,
            enhancement: rules.enhancement.clone(),
        })
    }

    pub fn run(&self, input: &HookInput, options: &RunOptions<'_>) -> Outcome {
        let prompt = input.prompt.as_str();
        if options.guard.suppresses(prompt) {
            debug!("Enhance guard active, skipping");
            return Outcome::default();
        }

        let prompt_lower = prompt.to_lowercase();
        let prompt_chars = prompt.chars().count();

        let skills = self.matcher.find_matches(&prompt_lower);
        let related = if options.tfidf {
            self.related_skills(&prompt_lower, &skills)
        } else {
            Vec::new()
        };
        let enhancements = self
            .enhancement
            .as_ref()
            .map(|rules| match_enhancements(&prompt_lower, rules))
            .unwrap_or_default();

        info!(
            "Matched {} skills, {} related, {} enhancement rules",
            skills.len(),
            related.len(),
            enhancements.len()
        );

        let has_match = !skills.is_empty() || !related.is_empty() || !enhancements.is_empty();

        if has_match {
            let enhanced_prompt = match options.rewriter {
                Some(rewriter) if prompt_chars > MIN_ENHANCE_PROMPT_CHARS => {
                    enhance(rewriter, input, options.timeout)
                }
                _ => None,
            };

            let report = Report::Activation(ActivationReport {
                skills: skills.clone(),
                related: related.clone(),
                suggestions: collect_suggestions(&enhancements),
                enhanced_prompt: enhanced_prompt.clone(),
            });

            return Outcome {
                skills,
                related,
                enhancements,
                recommendation: None,
                enhanced_prompt,
                report: Some(report),
            };
        }

        if prompt_chars > FALLBACK_MIN_PROMPT_CHARS {
            let recommendation = classify(prompt);
            debug!("No matches, recommending {}", recommendation.skill);
            return Outcome {
                recommendation: Some(recommendation),
                report: Some(Report::Fallback(recommendation)),
                ..Outcome::default()
            };
        }

        debug!("No matches and prompt too short for a recommendation");
        Outcome::default()
    }

    /// TF-IDF hits over all skills, minus those the rule matcher already found.
    fn related_skills(&self, prompt: &str, matched: &[SkillMatch]) -> Vec<SkillMatch> {
        let already: HashSet<&str> = matched.iter().map(|m| m.name.as_str()).collect();
        let result = match_candidates(prompt, &self.candidates);
        debug!(
            "TF-IDF scored {}/{} candidates in {}ms",
            result.metadata.matched_candidates,
            result.metadata.total_candidates,
            result.metadata.elapsed_ms
        );

        result
            .matches
            .into_iter()
            .filter_map(|scored| {
                let name = scored.candidate.skill?;
                if already.contains(name.as_str()) {
                    return None;
                }
                let skill = self.matcher.skills().iter().find(|s| s.name == name)?;
                Some(SkillMatch {
                    name,
                    match_type: MatchType::TfIdf,
                    priority: skill.priority,
                    enforcement: skill.enforcement,
                    score: Some(scored.tfidf_score),
                })
            })
            .collect()
    }
}

/// One rewriter attempt; any failure means no enhanced prompt.
fn enhance(rewriter: &dyn PromptRewriter, input: &HookInput, timeout: Duration) -> Option<String> {
    let request = RewriteRequest {
        prompt: &input.prompt,
        cwd: &input.cwd,
        timeout,
    };

    match rewriter.rewrite(&request) {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => {
            debug!("Rewriter returned empty output");
            None
        }
        Err(e) => {
            warn!("Prompt enhancement skipped: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Workflow;
    use crate::rewriter::RewriteError;
    use crate::rules::{EnhancementRules, SkillRules};
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    struct FakeRewriter {
        reply: std::result::Result<&'static str, ()>,
        calls: Cell<usize>,
        last_timeout: RefCell<Option<Duration>>,
    }

    impl FakeRewriter {
        fn ok(reply: &'static str) -> Self {
            Self {
                reply: Ok(reply),
                calls: Cell::new(0),
                last_timeout: RefCell::new(None),
            }
        }

        fn timing_out() -> Self {
            Self {
                reply: Err(()),
                ..Self::ok("")
            }
        }
    }

    impl PromptRewriter for FakeRewriter {
        fn rewrite(
            &self,
            request: &RewriteRequest<'_>,
        ) -> std::result::Result<String, RewriteError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_timeout.borrow_mut() = Some(request.timeout);
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(RewriteError::Timeout(request.timeout)),
            }
        }
    }

    fn create_test_activation() -> Activation {
        let skills: SkillRules = serde_json::from_str(
            r#"{
            "version": "1.0",
            "skills": {
                "backend-dev-guidelines": {
                    "type": "domain",
                    "enforcement": "suggest",
                    "priority": "high",
                    "description": "REST controllers, services and repositories",
                    "promptTriggers": { "keywords": ["controller", "backend"] }
                },
                "caching-expert": {
                    "type": "domain",
                    "enforcement": "suggest",
                    "priority": "medium",
                    "description": "Redis caching, TTL and invalidation strategies",
                    "promptTriggers": { "intentPatterns": ["cache.*(warm|evict)"] }
                }
            }
        }"#,
        )
        .unwrap();
        let enhancement: EnhancementRules = serde_json::from_str(
            r#"{
            "version": "1.0",
            "enhancementRules": {
                "api": {
                    "patterns": ["endpoint"],
                    "suggestions": ["Specify the HTTP method"],
                    "relatedSkill": "backend-dev-guidelines",
                    "priority": "high"
                }
            }
        }"#,
        )
        .unwrap();

        Activation::new(&LoadedRules {
            skills_path: PathBuf::from("skill-rules.json"),
            skills,
            enhancement_path: None,
            enhancement: Some(enhancement),
        })
        .unwrap()
    }

    fn input(prompt: &str) -> HookInput {
        HookInput::from_json(&serde_json::json!({ "prompt": prompt }).to_string()).unwrap()
    }

    #[test]
    fn test_keyword_match_builds_activation_report() {
        let activation = create_test_activation();
        let outcome = activation.run(&input("Add a Controller for orders"), &RunOptions::default());

        assert_eq!(outcome.skills.len(), 1);
        assert_eq!(outcome.skills[0].name, "backend-dev-guidelines");
        assert!(outcome.recommendation.is_none());
        let text = outcome.report.unwrap().to_string();
        assert!(text.contains("📚 RECOMMENDED SKILLS:\n  → backend-dev-guidelines\n"));
    }

    #[test]
    fn test_enhancement_only_match_reports() {
        let activation = create_test_activation();
        let outcome = activation.run(&input("new endpoint please"), &RunOptions::default());

        assert!(outcome.skills.is_empty());
        assert_eq!(outcome.enhancements.len(), 1);
        let text = outcome.report.unwrap().to_string();
        assert!(text.contains("📝 CONTEXT ENHANCEMENT:\n  → Specify the HTTP method\n"));
    }

    #[test]
    fn test_rewriter_called_once_with_timeout() {
        let activation = create_test_activation();
        let rewriter = FakeRewriter::ok("Add an OrdersController with CRUD routes");
        let options = RunOptions {
            rewriter: Some(&rewriter),
            ..RunOptions::default()
        };
        let outcome = activation.run(&input("add an orders controller"), &options);

        assert_eq!(rewriter.calls.get(), 1);
        assert_eq!(*rewriter.last_timeout.borrow(), Some(REWRITE_TIMEOUT));
        assert_eq!(
            outcome.enhanced_prompt.as_deref(),
            Some("Add an OrdersController with CRUD routes")
        );
        assert!(outcome
            .report
            .unwrap()
            .to_string()
            .contains("ACTION: Use the enhanced prompt above"));
    }

    #[test]
    fn test_rewriter_timeout_degrades() {
        let activation = create_test_activation();
        let rewriter = FakeRewriter::timing_out();
        let options = RunOptions {
            rewriter: Some(&rewriter),
            ..RunOptions::default()
        };
        let outcome = activation.run(&input("add an orders controller"), &options);

        assert_eq!(rewriter.calls.get(), 1);
        assert!(outcome.enhanced_prompt.is_none());
        assert!(outcome
            .report
            .unwrap()
            .to_string()
            .contains("ACTION: Use Skill tool BEFORE responding"));
    }

    #[test]
    fn test_short_prompt_skips_rewriter() {
        let activation = create_test_activation();
        let rewriter = FakeRewriter::ok("never used");
        let options = RunOptions {
            rewriter: Some(&rewriter),
            ..RunOptions::default()
        };
        // 10 chars exactly: must be longer than 10
        let outcome = activation.run(&input("backend!!!"), &options);

        assert_eq!(outcome.skills.len(), 1);
        assert_eq!(rewriter.calls.get(), 0);
    }

    #[test]
    fn test_no_match_short_prompt_is_silent() {
        let activation = create_test_activation();
        let outcome = activation.run(&input("hello there all"), &RunOptions::default());
        assert_eq!("hello there all".len(), 15);
        assert!(outcome.report.is_none());
        assert!(outcome.recommendation.is_none());
    }

    #[test]
    fn test_no_match_long_prompt_falls_back() {
        let activation = create_test_activation();
        let rewriter = FakeRewriter::ok("never used");
        let options = RunOptions {
            rewriter: Some(&rewriter),
            ..RunOptions::default()
        };
        let outcome = activation.run(&input("please tidy up the readme wording"), &options);

        assert_eq!(rewriter.calls.get(), 0);
        assert_eq!(
            outcome.recommendation.map(|r| r.workflow),
            Some(Workflow::Sequential)
        );
        assert!(matches!(outcome.report, Some(Report::Fallback(_))));
    }

    #[test]
    fn test_guard_suppresses_everything() {
        let activation = create_test_activation();
        let rewriter = FakeRewriter::ok("never used");
        let options = RunOptions {
            guard: EnhanceGuard::Suppressed,
            rewriter: Some(&rewriter),
            ..RunOptions::default()
        };
        let outcome = activation.run(&input("add an orders controller"), &options);

        assert!(outcome.report.is_none());
        assert_eq!(rewriter.calls.get(), 0);
    }

    #[test]
    fn test_skip_markers() {
        assert!(EnhanceGuard::Allowed.suppresses("[ENHANCED] add a controller"));
        assert!(EnhanceGuard::Allowed.suppresses("x __skip_enhance__"));
        assert!(!EnhanceGuard::Allowed.suppresses("add a controller"));
        assert!(EnhanceGuard::from_flag(true).suppresses("add a controller"));
    }

    #[test]
    fn test_tfidf_related_skills() {
        let activation = create_test_activation();
        let options = RunOptions {
            tfidf: true,
            ..RunOptions::default()
        };
        let outcome = activation.run(&input("backend redis caching with a short ttl"), &options);

        assert_eq!(outcome.skills[0].name, "backend-dev-guidelines");
        assert_eq!(outcome.related.len(), 1);
        assert_eq!(outcome.related[0].name, "caching-expert");
        assert_eq!(outcome.related[0].match_type, MatchType::TfIdf);
        assert!(outcome.related[0].score.unwrap() > 0.0);
    }

    #[test]
    fn test_tfidf_off_by_default() {
        let activation = create_test_activation();
        let outcome = activation.run(
            &input("redis caching with a short ttl for sessions"),
            &RunOptions::default(),
        );
        assert!(outcome.related.is_empty());
        assert!(matches!(outcome.report, Some(Report::Fallback(_))));
    }
}
