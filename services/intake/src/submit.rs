use crate::infra::read_form_fields;
use clap::Args;
use guarantor_intake::config::AppConfig;
use guarantor_intake::error::AppError;
use guarantor_intake::intake::{
    AccessToken, BannerKind, FormError, GuarantorCollection,
    HttpIntakeGateway, IntakeForm, IntakeGateway, SubmissionOutcome, ZipCandidate,
    ZipLookupState,
};
use guarantor_intake::intake::zip::ZIP_NOT_FOUND_MESSAGE;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// JSON object keyed by `guarantors[i][field]` input names
    #[arg(long)]
    pub(crate) fields: PathBuf,
    /// Access token from the secure link
    #[arg(long, conflicts_with = "link")]
    pub(crate) token: Option<String>,
    /// Full secure link (`/f/<token>` or `?token=<token>`)
    #[arg(long)]
    pub(crate) link: Option<String>,
    /// Choose a ZIP candidate for an ambiguous entry, as `POSITION:CHOICE` (both 1-based)
    #[arg(long = "pick", value_parser = parse_pick)]
    pub(crate) picks: Vec<(usize, usize)>,
    /// Print the payload instead of posting it
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ZipArgs {
    /// ZIP code to resolve (first five digits are used)
    pub(crate) zip: String,
}

fn parse_pick(raw: &str) -> Result<(usize, usize), String> {
    let (position, choice) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected POSITION:CHOICE, got `{raw}`"))?;
    let position = position
        .trim()
        .parse()
        .map_err(|_| format!("invalid position `{position}`"))?;
    let choice: usize = choice
        .trim()
        .parse()
        .map_err(|_| format!("invalid choice `{choice}`"))?;
    if choice == 0 {
        return Err("choices are numbered from 1".to_string());
    }
    Ok((position, choice))
}

pub(crate) async fn run_submit(config: &AppConfig, args: SubmitArgs) -> Result<(), AppError> {
    let SubmitArgs {
        fields,
        token,
        link,
        picks,
        dry_run,
    } = args;

    let token = match (token, link) {
        (Some(raw), _) => AccessToken::new(raw).ok(),
        (None, Some(link)) => AccessToken::from_link(&link),
        (None, None) => None,
    };

    let collection = GuarantorCollection::from_form_fields(read_form_fields(&fields)?);
    let mut form = IntakeForm::with_collection(token, collection);
    if let Some(banner) = form.banner() {
        println!("! {}", banner.message);
    }

    let gateway = HttpIntakeGateway::new(&config.gateway)?;
    for ticket in form.refresh_zip_lookups()? {
        form.resolve_zip(&gateway, ticket).await;
    }
    for (position, choice) in picks {
        let candidate = form.select_zip_candidate(position, choice - 1)?;
        println!(
            "Guarantor {position}: using {}, {}",
            candidate.city, candidate.state
        );
    }

    print_zip_states(&form);

    let Some(collection) = form.collection() else {
        return Err(FormError::Closed.into());
    };
    let errors = collection.errors();
    if !errors.is_empty() {
        println!("Form has {} problem(s):", errors.len());
        for (position, error) in &errors {
            println!("  - guarantor {position} {}: {}", error.field.label(), error.message);
        }
        return Err(FormError::Invalid(errors.len()).into());
    }

    if dry_run {
        let payload = form.begin_submission()?;
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let outcome = form.submit(&gateway).await?;
    if let Some(banner) = form.banner() {
        let marker = match banner.kind {
            BannerKind::Ok => "ok",
            BannerKind::Error => "error",
        };
        println!("[{marker}] {}", banner.message);
    }
    if let Some(confirmation) = form.confirmation() {
        println!("{}\n{}", confirmation.title, confirmation.hint);
    }
    info!(?outcome, "submit command finished");

    match outcome {
        SubmissionOutcome::Accepted => Ok(()),
        SubmissionOutcome::Rejected => {
            let message = form
                .banner()
                .map(|banner| banner.message.clone())
                .unwrap_or_default();
            Err(AppError::Rejected(message))
        }
    }
}

fn print_zip_states(form: &IntakeForm) {
    let Some(collection) = form.collection() else {
        return;
    };

    for entry in collection.entries() {
        let position = entry.position();
        match entry.zip_flow().state() {
            ZipLookupState::ResolvedMultiple(candidates) => {
                println!(
                    "Guarantor {position}: ZIP matches several places, choose with --pick {position}:<n>"
                );
                print_candidates(candidates);
            }
            ZipLookupState::ResolvedSingle(candidate) => {
                println!(
                    "Guarantor {position}: ZIP resolved to {}, {}",
                    candidate.city, candidate.state
                );
            }
            ZipLookupState::NotFound | ZipLookupState::Failed(_) => {
                if let Some(message) = entry.zip_flow().error_message() {
                    println!("Guarantor {position}: {message}");
                }
            }
            ZipLookupState::Idle | ZipLookupState::Loading => {}
        }
    }
}

fn print_candidates(candidates: &[ZipCandidate]) {
    for (index, candidate) in candidates.iter().enumerate() {
        match &candidate.county {
            Some(county) => println!(
                "  {}. {}, {} ({county} County)",
                index + 1,
                candidate.city,
                candidate.state
            ),
            None => println!("  {}. {}, {}", index + 1, candidate.city, candidate.state),
        }
    }
}

pub(crate) async fn run_zip_lookup(config: &AppConfig, args: ZipArgs) -> Result<(), AppError> {
    let gateway = HttpIntakeGateway::new(&config.gateway)?;
    let response = gateway.lookup_zip(args.zip.trim()).await?;

    let candidates = response.results.unwrap_or_default();
    if !response.success || candidates.is_empty() {
        println!(
            "{}",
            response
                .message
                .unwrap_or_else(|| ZIP_NOT_FOUND_MESSAGE.to_string())
        );
        return Ok(());
    }

    println!("{} match(es) for {}:", candidates.len(), args.zip.trim());
    print_candidates(&candidates);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_parse_position_and_choice() {
        assert_eq!(parse_pick("2:1"), Ok((2, 1)));
        assert!(parse_pick("2").is_err());
        assert!(parse_pick("1:0").is_err());
    }
}
