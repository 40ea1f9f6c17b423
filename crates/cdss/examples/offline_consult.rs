//! Offline consultation example: a full recommendation and follow-up round
//! against a scripted backend, no API key needed.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p cdss --example offline_consult
//! ```

use std::sync::Arc;

use cdss::prelude::*;

const SCRIPTED_REPLY: &str = "\
1. **Likely Diagnosis:** Major depressive disorder, single episode, moderate
2. **Differential Diagnoses:**
- Bipolar II disorder
- Adjustment disorder
3. **Clinical Reasoning:** Persistent low mood with insomnia.
4. **Treatment Plan:** Sertraline 50mg daily; refer for CBT.
5. **Monitoring and Follow-up:** Review in 2 weeks; PHQ-9 each visit.
6. **ICD-11 Code:** 6A70.1";

#[tokio::main]
async fn main() -> Result<(), ConsultError> {
    // 1. A backend that answers without a network call.
    let backend = FnBackend::new(|req: &ChatRequest| {
        let last = req.messages.last().map_or("", |m| m.content.as_str());
        if last.contains("## Question") {
            Ok("Yes. CBT-I is first line for insomnia alongside depression.".to_string())
        } else {
            Ok(SCRIPTED_REPLY.to_string())
        }
    });
    let consultant = Consultant::new(Arc::new(backend), ConsultConfig::default());

    // 2. The form values.
    let input = ClinicalInput::new(SymptomCategory::MoodDisorders, Severity::Moderate)
        .with_symptoms(["Persistent sadness", "Insomnia"]);

    // 3. Recommendation, then one follow-up in the same session.
    let mut session = Session::new();
    let rec = consultant.generate_recommendations(&mut session, &input).await?;
    for section in rec.sections() {
        println!("## {}\n{}\n", section.label, section.text());
    }

    let answer = consultant
        .ask_follow_up(&mut session, "Would CBT-I be appropriate?")
        .await?;
    println!("{answer}\n");

    for entry in session.history() {
        println!("[{}] {entry}", entry.at.format("%H:%M:%S"));
    }
    Ok(())
}
