//! Fallback workflow recommendation for prompts no rule matched.
//!
//! Checks run in a fixed order and the first hit wins:
//!
//! 1. short (< 50 chars) or a simple cue     -> sequential
//! 2. a parallel cue                          -> parallel
//! 3. a complex cue or long (> 200 chars)     -> orchestration
//! 4. otherwise                               -> auto-managed workflow

/// Below this many chars a prompt counts as simple
const SHORT_PROMPT_CHARS: usize = 50;

/// Above this many chars a prompt counts as complex
const LONG_PROMPT_CHARS: usize = 200;

const PARALLEL_CUES: [&str; 8] = [
    "여러", "동시", "병렬", "parallel", "concurrent", "각각", "모두", "전부",
];

const COMPLEX_CUES: [&str; 9] = [
    "복잡", "전체", "통합", "대규모", "complex", "full", "entire", "시스템", "아키텍처",
];

const SIMPLE_CUES: [&str; 7] = ["간단", "단순", "하나", "simple", "single", "quick", "빠르게"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Sequential,
    Parallel,
    Orchestration,
    AutoManaged,
}

impl Workflow {
    /// Skill that runs this workflow
    pub fn skill(&self) -> &'static str {
        match self {
            Workflow::Sequential => "sequential-task-processor",
            Workflow::Parallel => "parallel-task-executor",
            Workflow::Orchestration => "dynamic-task-orchestrator",
            Workflow::AutoManaged => "agent-workflow-manager",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Workflow::Sequential => "간단한 순차 작업에 적합",
            Workflow::Parallel => "독립 작업 병렬 처리에 최적",
            Workflow::Orchestration => "복잡한 프로젝트 조율에 적합",
            Workflow::AutoManaged => "자동 워크플로우 분석 및 실행",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub workflow: Workflow,
    pub skill: &'static str,
    pub reason: &'static str,
}

impl From<Workflow> for Recommendation {
    fn from(workflow: Workflow) -> Self {
        Self {
            workflow,
            skill: workflow.skill(),
            reason: workflow.reason(),
        }
    }
}

fn has_cue(prompt: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| prompt.contains(cue))
}

/// Classify the workflow shape of `prompt` (original casing; length is in chars).
pub fn classify(prompt: &str) -> Recommendation {
    let lower = prompt.to_lowercase();
    let length = prompt.chars().count();

    let workflow = if length < SHORT_PROMPT_CHARS || has_cue(&lower, &SIMPLE_CUES) {
        Workflow::Sequential
    } else if has_cue(&lower, &PARALLEL_CUES) {
        Workflow::Parallel
    } else if has_cue(&lower, &COMPLEX_CUES) || length > LONG_PROMPT_CHARS {
        Workflow::Orchestration
    } else {
        Workflow::AutoManaged
    };

    workflow.into()
}
