//! Prompt construction. Pure string builders, no I/O.
//!
//! All three prompts pin the output language and forbid any content outside
//! the requested format, since everything the model returns is re-parsed by
//! the services.

use crate::models::GeneratedAnswer;

/// Prompt for generating the four calibrated reference answers for every
/// question of a topic in a single call.
///
/// The model is asked for `{"items": [{"index": .., "answers": [..]}]}`
/// where `index` refers back to the position of the question in `questions`.
pub fn batch_generation(title: &str, questions: &[String], lang: &str) -> String {
    let numbered = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{i}. {q}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are creating four distinct answers per question to train critical thinking.
Language: write every answer entirely in {lang}. Do not mix languages.

Topic: {title}

Questions (zero-based index, keep the numbering):
{numbered}

Produce STRICT JSON with an array 'items', one item per question above:
- 'index': the zero-based index of the question being answered
- 'answers': exactly four items, each with:
  - 'level': one of ['low','low','medium','high'] exactly two lows, one medium, one high
  - 'score': 50 for low, 75 for medium, 100 for high
  - 'text': the answer content (unique; no overlap; correct tone for {lang})

Constraints:
- Cover every question exactly once.
- All four answers to a question must be unique in reasoning and detail.
- Do NOT include any commentary outside JSON.

Example:
{{"items":[
  {{"index":0,"answers":[
    {{"level":"low","score":50,"text":"..."}},
    {{"level":"low","score":50,"text":"..."}},
    {{"level":"medium","score":75,"text":"..."}},
    {{"level":"high","score":100,"text":"..."}}
  ]}}
]}}
"#
    )
}

/// Prompt for grading one student answer against the four reference answers.
pub fn evaluation(
    question: &str,
    student_answer: &str,
    references: &[GeneratedAnswer],
    lang: &str,
) -> String {
    let golds = references
        .iter()
        .map(|g| {
            format!(
                "- level: {}, score: {}\ntext: {}",
                g.level.label(),
                g.level.anchor_score(),
                g.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an impartial grader for middle school critical thinking.

Question:
{question}

Student answer:
{student_answer}

Reference set (four answers with levels and anchor scores):
{golds}

Scoring policy (STRICT):
- First, decide which single reference level the student's answer most closely matches: low (50), medium (75), or high (100).
- Let base score be exactly 50, 75, or 100 based on that chosen level.
- Then apply a small integer adjustment in the range -5..+5 to reflect nuances (clarity, evidence, structure).
- Final score = base + adjustment. Final must be an integer in 0..100 (after clamping if needed).
- Examples:
  * if closest level = low, final typically 50..55
  * if closest level = medium, final typically 70..80 (centered at 75)
  * if closest level = high, final typically 95..100 (or 90..100 if slightly weaker)

Tasks:
1) Briefly justify the chosen level (<= 3 sentences).
2) Provide strengths (bullets) and concrete actionable recommendations (bullets).
3) Provide a short 'advice' paragraph with next steps.

Output STRICT JSON (no extra text):
{{
  "match_level": "low|medium|high",
  "base": 50|75|100,
  "adjustment": -5| -4| -3| -2| -1| 0| 1| 2| 3| 4| 5,
  "score": <integer 0..100>,
  "rationale": "<= 3 sentences",
  "strengths": ["bullet 1", "bullet 2"],
  "recommendations": ["action 1", "action 2", "action 3"],
  "advice": "one short paragraph"
}}

Language: match the student's answer language; if ambiguous, use the question's language, otherwise {lang}.
No text outside JSON. Do not mix languages.
"#
    )
}

/// Prompt for the plain-text study conspectus attached to a topic.
pub fn conspectus(title: &str, questions: &[String], lang: &str) -> String {
    let guiding = questions
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n- ");

    format!(
        r#"You are a middle-school educator. Create a comprehensive yet concise lesson conspectus on the topic below.
Language: {lang}. Write entirely in {lang}; do not mix languages. The style should be clear, structured, actionable.

Topic: {title}

Guiding questions to cover:
- {guiding}

Write a single continuous conspectus (no JSON, no markup), with:
- 6-10 short sections with headers,
- key definitions, short examples, common misconceptions,
- quick checks (questions) and 3-5 actionable tips at the end.

Do not include any meta commentary or JSON. Output plain text only.
"#
    )
}
