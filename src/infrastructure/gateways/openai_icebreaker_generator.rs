// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{build_client, check_status, endpoint, parse_base_url, transport_error};
use crate::config::settings::LlmSettings;
use crate::domain::gateways::icebreaker_generator::IcebreakerGenerator;
use crate::domain::gateways::GatewayError;
use crate::domain::models::lead::LeadProfile;
use crate::domain::models::organization::PersonalizationContext;
use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

const SYSTEM_PROMPT: &str = "You write the first line of a cold outreach email. \
Reply with one or two sentences of plain text, no greeting, no sign-off, no quotes.";

/// 开场白生成器 - 基于 OpenAI 兼容的 chat completions 接口
///
/// # 配置
///
/// 通过 `llm` 配置段设置：
/// - `api_key` - API密钥
/// - `model` - 模型名称
/// - `api_base_url` - API基础URL
pub struct OpenAiIcebreakerGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base_url: Url,
    max_tokens: u32,
}

impl OpenAiIcebreakerGenerator {
    pub fn new(settings: &LlmSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(settings.timeout_secs),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_base_url: parse_base_url(&settings.api_base_url)?,
            max_tokens: settings.max_tokens,
        })
    }
}

fn push_line(prompt: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(value);
        prompt.push('\n');
    }
}

/// 由线索画像与组织上下文拼出用户提示词
pub(crate) fn build_prompt(profile: &LeadProfile, context: &PersonalizationContext) -> String {
    let mut prompt = String::from("Prospect:\n");
    push_line(&mut prompt, "Name", profile.full_name.as_deref());
    push_line(&mut prompt, "Title", profile.title.as_deref());
    push_line(&mut prompt, "Headline", profile.headline.as_deref());
    push_line(&mut prompt, "Company", profile.company.as_deref());
    push_line(
        &mut prompt,
        "Company description",
        profile.company_description.as_deref(),
    );
    push_line(&mut prompt, "Location", profile.location.as_deref());

    prompt.push_str("\nSender:\n");
    push_line(&mut prompt, "Company", context.sender_company.as_deref());
    push_line(&mut prompt, "About", context.company_description.as_deref());
    push_line(
        &mut prompt,
        "Value proposition",
        context.value_proposition.as_deref(),
    );
    push_line(&mut prompt, "Tone", context.tone.as_deref());
    push_line(
        &mut prompt,
        "Instructions",
        context.custom_instructions.as_deref(),
    );
    prompt
}

#[async_trait]
impl IcebreakerGenerator for OpenAiIcebreakerGenerator {
    async fn generate(
        &self,
        profile: &LeadProfile,
        context: &PersonalizationContext,
    ) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| GatewayError::Rejected {
            status: 401,
            message: "LLM API key not configured".to_string(),
        })?;

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(profile, context) }
            ],
            "temperature": 0.7,
            "max_tokens": self.max_tokens
        });

        let url = endpoint(&self.api_base_url, "chat/completions")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "chat completions").await?;
        let body: Value = response.json().await.map_err(transport_error)?;

        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().trim_matches('"').trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GatewayError::InvalidResponse(
                "LLM returned no icebreaker text".to_string(),
            ));
        }
        Ok(text)
    }
}
