//! Prompt construction for the generation model and the verifier oracle.
//!
//! Chat-template framing (turn markers, role tags) is the concern of the
//! engine adapter for a concrete model; these prompts carry only the task
//! instructions and the source material.

use crate::soap::note::Section;
use crate::soap::rules;

/// Prompt asking the generation model to draft a strict SOAP note from a
/// doctor-patient dialogue.
pub fn generation_prompt(dialogue: &str) -> String {
    format!(
        r#"You are an expert medical scribe. Summarize the following doctor-patient dialogue into a strict SOAP note format.

Return your answer as a single JSON object with exactly these four keys: "subjective", "objective", "assessment", "plan".

CRITICAL INSTRUCTIONS:

1. STRICT SECTION DEFINITIONS — SOURCE OF INFORMATION IS EVERYTHING:
   - subjective: ONLY what the patient (or their caregiver) verbally reports. This includes their described symptoms, personal timeline, self-measured or home-measured vitals (e.g. "I had a fever of 38.5 at home"), OTC medications taken before the visit, and their own assessment of severity. Never place anything here that the doctor observed, tested, or measured.
   - objective: ONLY measurements, findings, and observations actively obtained by the doctor or clinical staff during this encounter. This includes vitals taken in the clinic, physical exam findings, and lab or imaging results ordered and reviewed during the visit. If the patient reported a number from home (e.g. a home blood pressure reading or a self-measured temperature), it belongs in subjective, not here.
   - assessment: ONLY the physician's explicit diagnoses, impressions, or differential diagnoses as stated in the dialogue. Do not infer or expand on diagnoses not mentioned.
   - plan: ONLY treatments, prescriptions, tests, referrals, and follow-up instructions explicitly spoken by the doctor in the dialogue. Do not add standard medical boilerplate, general wellness advice, or any action not directly stated by the doctor.

2. ZERO HALLUCINATION POLICY:
   - Do NOT infer, assume, or invent any medical information not explicitly present in the dialogue.
   - Do NOT insert generic medical advice such as "rest, hydration, monitoring" or standard care steps unless the doctor explicitly said them.
   - Do NOT complete or extrapolate a plan based on what would typically be done for a given diagnosis. Only transcribe what was said.

3. MISSING INFO: If a section was not discussed in the dialogue, strictly use the value "Not discussed." for that key.

4. OUTPUT FORMAT: Return only the raw JSON object. No markdown, no code fences, no extra text.

Dialogue:
{dialogue}"#
    )
}

/// Prompt asking the verifier oracle for a KEEP/HALLUCINATION verdict on a
/// single claim, with the section's rule text as the placement contract.
pub fn verification_prompt(transcript: &str, section: Section, claim: &str) -> String {
    format!(
        r#"Original Transcript:
{transcript}

SOAP Section Being Evaluated: {section}
Section Rule: {rule}

Claim to verify: "{claim}"

TASK: Determine whether this claim should be KEPT or flagged as a HALLUCINATION.

ANSWER YES (KEEP) only if ALL of the following are true:
  1. The underlying information is directly stated in the transcript, or is a legitimate clinical
     paraphrase of transcript content (e.g. "rhinorrhea" for "runny nose").
  2. The claim is placed in the correct SOAP section per the Section Rule above.
  3. If the claim is in the Objective section, it reflects a finding the clinician actually
     observed or measured during the encounter — NOT a patient self-report, NOT a planned
     exam step, and NOT a finding from a prior visit unless re-confirmed today.

ANSWER HALLUCINATION if ANY of the following are true:
  1. The claim introduces details not present in the transcript (fabricated medications,
     referrals, diagnostics, follow-up instructions, or exam findings not mentioned).
  2. The claim misrepresents transcript content (e.g. states "no fever" when the transcript
     describes a resolved fever).
  3. The claim is in the wrong SOAP section — e.g. a patient self-report in the Objective
     section, or a planned action in the Assessment section.
  4. The claim is an Objective finding but the physical exam had not yet been performed
     in the transcript. In that case, fabricated exam findings are hallucinations.

IMPORTANT: Adverse reactions or medication intolerances explicitly mentioned by the patient
(e.g. "decongestant made my heart race") must be KEPT if they appear in the transcript,
regardless of which section they are in — flag only if misplaced in Objective.

FORMAT YOUR RESPONSE EXACTLY LIKE THIS:
Answer: [YES or HALLUCINATION]
Reason: [one sentence explaining why]
Quote: [EXACT QUOTE FROM TRANSCRIPT supporting the claim, if Answer is YES | None if HALLUCINATION]"#,
        rule = rules::rule_text(section),
    )
}
