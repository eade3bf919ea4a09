// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{cto_filters, raw_lead_with_email, TestContext};
use chrono::Utc;
use leadsync::domain::models::campaign::{Campaign, CampaignOptions, CampaignStatus, SequenceStep};
use leadsync::domain::models::lead::{Lead, LeadCampaignStatus};
use leadsync::domain::models::search_job::{JobStatus, SearchJob};
use leadsync::domain::repositories::campaign_repository::CampaignRepository;
use leadsync::domain::repositories::lead_repository::LeadRepository;
use leadsync::domain::repositories::organization_repository::OrganizationRepository;
use leadsync::domain::repositories::search_job_repository::{RepositoryError, SearchJobRepository};
use uuid::Uuid;

#[tokio::test]
async fn test_search_job_round_trip_and_status_query() {
    let ctx = TestContext::new().await;
    let job = SearchJob::new(ctx.organization.id, cto_filters(50));
    let created = ctx.jobs_repo.create(&job).await.unwrap();
    assert_eq!(created.status, JobStatus::Pending);

    let running = created.start("run-42".to_string()).unwrap();
    ctx.jobs_repo.update(&running).await.unwrap();

    let stored = ctx.jobs_repo.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Running);
    assert_eq!(stored.remote_run_id.as_deref(), Some("run-42"));
    assert_eq!(stored.filters.contact_job_title, vec!["CTO".to_string()]);
    assert_eq!(stored.filters.fetch_count, 50);

    let running = ctx
        .jobs_repo
        .find_by_status(JobStatus::Running)
        .await
        .unwrap();
    assert_eq!(running.len(), 1);
    assert!(ctx
        .jobs_repo
        .find_by_status(JobStatus::Completed)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_lead_dedup_is_scoped_to_organization() {
    let ctx = TestContext::new().await;
    let raw = raw_lead_with_email("Dup@Example.com");

    let first = Lead::from_import(ctx.organization.id, None, &raw).unwrap();
    assert!(ctx.leads_repo.insert_if_absent(&first).await.unwrap());

    let again = Lead::from_import(
        ctx.organization.id,
        None,
        &raw_lead_with_email("dup@example.com"),
    )
    .unwrap();
    assert!(!ctx.leads_repo.insert_if_absent(&again).await.unwrap());

    let other_org = Lead::from_import(Uuid::new_v4(), None, &raw).unwrap();
    assert!(ctx.leads_repo.insert_if_absent(&other_org).await.unwrap());

    let found = ctx
        .leads_repo
        .find_by_email(ctx.organization.id, "dup@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
    assert_eq!(found.email, "Dup@Example.com");
    assert_eq!(found.raw_payload["email"], "Dup@Example.com");
}

#[tokio::test]
async fn test_mark_queued_skips_leads_already_in_a_campaign() {
    let ctx = TestContext::new().await;
    let a = ctx.seed_lead("a@example.com", true).await;
    let b = ctx.seed_lead("b@example.com", true).await;
    let first_campaign = Uuid::new_v4();
    let second_campaign = Uuid::new_v4();

    let changed = ctx
        .leads_repo
        .mark_queued(&[a.id], first_campaign)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let changed = ctx
        .leads_repo
        .mark_queued(&[a.id, b.id], second_campaign)
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let a = ctx.leads_repo.find_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(a.campaign_id, Some(first_campaign));
    assert_eq!(a.campaign_status, LeadCampaignStatus::Queued);
    assert_eq!(
        ctx.leads_repo
            .find_by_campaign(second_campaign)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_attach_remote_id_only_once() {
    let ctx = TestContext::new().await;
    let campaign = Campaign::new(ctx.organization.id, "CAS").unwrap();
    ctx.campaigns_repo.create(&campaign).await.unwrap();

    assert!(ctx
        .campaigns_repo
        .attach_remote_id_if_absent(campaign.id, "remote-a")
        .await
        .unwrap());
    assert!(!ctx
        .campaigns_repo
        .attach_remote_id_if_absent(campaign.id, "remote-b")
        .await
        .unwrap());

    let stored = ctx
        .campaigns_repo
        .find_by_remote_id("remote-a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, campaign.id);
    assert!(ctx
        .campaigns_repo
        .find_by_remote_id("remote-b")
        .await
        .unwrap()
        .is_none());
    assert_eq!(ctx.campaigns_repo.find_linked().await.unwrap().len(), 1);
    assert!(ctx
        .campaigns_repo
        .find_unlinked(None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_campaign_config_round_trips_through_json_columns() {
    let ctx = TestContext::new().await;
    let mut campaign = Campaign::new(ctx.organization.id, "Json").unwrap();
    ctx.campaigns_repo.create(&campaign).await.unwrap();

    campaign.options = CampaignOptions {
        daily_limit: 75,
        stop_on_reply: false,
        open_tracking: false,
        link_tracking: true,
    };
    campaign.sequences = vec![SequenceStep {
        subject: "Hello".to_string(),
        body: "{{personalization}}".to_string(),
        delay_days: 0,
    }];
    campaign.sending_account_ids = vec![Uuid::new_v4()];
    ctx.campaigns_repo.update_config(&campaign).await.unwrap();
    ctx.campaigns_repo
        .mark_config_synced(campaign.id, Utc::now())
        .await
        .unwrap();

    let stored = ctx
        .campaigns_repo
        .find_by_id(campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.options, campaign.options);
    assert_eq!(stored.sequences, campaign.sequences);
    assert_eq!(stored.sending_account_ids, campaign.sending_account_ids);
    assert!(stored.config_synced_at.is_some());

    // Saving new intent marks the remote copy stale; status is left alone
    ctx.campaigns_repo
        .update_status(campaign.id, CampaignStatus::Paused)
        .await
        .unwrap();
    campaign.options.daily_limit = 90;
    ctx.campaigns_repo.update_config(&campaign).await.unwrap();
    let stored = ctx
        .campaigns_repo
        .find_by_id(campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.options.daily_limit, 90);
    assert_eq!(stored.status, CampaignStatus::Paused);
    assert!(stored.config_synced_at.is_none());

    let missing = Campaign::new(ctx.organization.id, "Ghost").unwrap();
    let err = ctx.campaigns_repo.update_config(&missing).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    let err = ctx
        .campaigns_repo
        .update_status(missing.id, CampaignStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
async fn test_organization_context_round_trip() {
    let ctx = TestContext::new().await;
    let stored = ctx
        .organizations_repo
        .find_by_id(ctx.organization.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Acme Outreach");
    assert_eq!(
        stored.personalization.value_proposition.as_deref(),
        Some("Book more meetings")
    );
    assert!(ctx
        .organizations_repo
        .find_by_id(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
