use crate::infra::{load_directory, InMemoryGateway};
use clap::Args;
use guarantor_intake::error::AppError;
use guarantor_intake::intake::{
    digits_only, run_zip_lookup, AccessToken, GuarantorField, IntakeForm, ZipLookupState,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV with `zip,city,state,county` rows (defaults to a small built-in table)
    #[arg(long)]
    pub(crate) zip_csv: Option<PathBuf>,
}

const DEMO_PEOPLE: [[(GuarantorField, &str); 8]; 2] = [
    [
        (GuarantorField::FirstName, "Ada"),
        (GuarantorField::LastName, "Lovelace"),
        (GuarantorField::Ssn, "123-45-6789"),
        (GuarantorField::Email, "ada@example.com"),
        (GuarantorField::OwnershipPct, "60"),
        (GuarantorField::StreetNumber, "100"),
        (GuarantorField::StreetName, "Locust"),
        (GuarantorField::StreetType, "St"),
    ],
    [
        (GuarantorField::FirstName, "Grace"),
        (GuarantorField::LastName, "Hopper"),
        (GuarantorField::Ssn, "987654321"),
        (GuarantorField::Email, "grace@example.com"),
        (GuarantorField::OwnershipPct, "40"),
        (GuarantorField::StreetNumber, "12"),
        (GuarantorField::StreetName, "Screaming Eagle"),
        (GuarantorField::StreetType, "Blvd"),
    ],
];

const DEMO_ZIPS: [&str; 2] = ["50309", "42223"];

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let directory = load_directory(args.zip_csv.as_deref())?;
    let gateway = InMemoryGateway::new(directory);

    println!("Guarantor intake demo (sensitive fields redacted)");
    let token = AccessToken::from_link("https://intake.example.com/f/demo-token");
    let mut form = IntakeForm::new(token);
    form.add_guarantor()?;

    let mut tickets = Vec::new();
    for (index, person) in DEMO_PEOPLE.iter().enumerate() {
        let position = index + 1;
        for (field, value) in person {
            form.set_field(position, *field, *value)?;
        }
        if let Some(ticket) = form.set_field(position, GuarantorField::Zip, DEMO_ZIPS[index])? {
            tickets.push(ticket);
        }
    }
    println!(
        "- {} guarantor block(s) filled | form valid before ZIP lookups: {}",
        DEMO_PEOPLE.len(),
        form.is_form_valid()
    );

    // Lookups complete in reverse order to show they are matched back by entry.
    let mut completions = Vec::new();
    for ticket in tickets.into_iter().rev() {
        completions.push(run_zip_lookup(&gateway, ticket).await);
    }
    for completion in completions {
        form.apply_zip_completion(completion);
    }

    let ambiguous = describe_zip_states(&form);
    for position in ambiguous {
        let candidate = form.select_zip_candidate(position, 0)?;
        println!(
            "  Guarantor {position}: picked {}, {}",
            candidate.city, candidate.state
        );
    }

    println!("- Form valid: {} | can submit: {}", form.is_form_valid(), form.can_submit());
    if !form.can_submit() {
        if let Some(collection) = form.collection() {
            for (position, error) in collection.errors() {
                println!("  Guarantor {position}: {error}");
            }
        }
        return Ok(());
    }

    let outcome = form.submit(&gateway).await?;
    println!("- Submission outcome: {outcome:?}");
    if let Some(banner) = form.banner() {
        println!("  {}", banner.message);
    }
    if let Some(confirmation) = form.confirmation() {
        println!("  {}: {}", confirmation.title, confirmation.hint);
    }

    for payload in gateway.submissions() {
        println!("  Endpoint received {} guarantor(s):", payload.guarantors.len());
        for guarantor in &payload.guarantors {
            println!(
                "    - {} {} | SSN ***-**-{} | {}, {} {}",
                guarantor.first_name,
                guarantor.last_name,
                last_four(&guarantor.ssn),
                guarantor.city,
                guarantor.state,
                guarantor.zip
            );
        }
    }

    Ok(())
}

/// Print each entry's ZIP state; returns positions still waiting for a choice.
fn describe_zip_states(form: &IntakeForm) -> Vec<usize> {
    let Some(collection) = form.collection() else {
        return Vec::new();
    };

    let mut ambiguous = Vec::new();
    for entry in collection.entries() {
        let state = entry.zip_flow().state();
        match state {
            ZipLookupState::ResolvedSingle(candidate) => println!(
                "  Guarantor {}: ZIP {} -> {}, {}",
                entry.position(),
                entry.value(GuarantorField::Zip),
                candidate.city,
                candidate.state
            ),
            ZipLookupState::ResolvedMultiple(candidates) => {
                println!(
                    "  Guarantor {}: ZIP {} matches {} places",
                    entry.position(),
                    entry.value(GuarantorField::Zip),
                    candidates.len()
                );
                ambiguous.push(entry.position());
            }
            other => println!("  Guarantor {}: ZIP {}", entry.position(), other.label()),
        }
    }
    ambiguous
}

fn last_four(ssn: &str) -> String {
    let digits = digits_only(ssn);
    digits[digits.len().saturating_sub(4)..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_all_but_last_four_digits() {
        assert_eq!(last_four("123-45-6789"), "6789");
        assert_eq!(last_four("12"), "12");
    }

    #[tokio::test]
    async fn demo_runs_against_built_in_directory() {
        run_demo(DemoArgs::default()).await.expect("demo completes");
    }
}
