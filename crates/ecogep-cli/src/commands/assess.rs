//! Assess command implementation

use crate::cli::AssessArgs;
use crate::errors;
use crate::interactive;
use crate::output::OutputWriter;
use crate::output_types::{AssessOutput, BreakdownRow};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use console::style;
use ecogep_core::config::LayeredConfig;
use ecogep_core::models::{format_money, ValuationReport};
use ecogep_core::SessionContext;
use ecogep_llm::{ChatModel, RetryPolicy, ValuationPipeline, VisionModel, ZhipuClient};
use std::path::Path;

pub async fn execute(args: AssessArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    if !args.image.is_file() {
        return Err(errors::image_not_found(&args.image).into());
    }

    let api_key = interactive::resolve_api_key(!output.is_json())?;
    let client = ZhipuClient::from_config(config, api_key).context("Failed to create API client")?;
    let pipeline = ValuationPipeline::new(
        client.vision(config.vision_model.value.as_str()),
        client.chat(config.chat_model.value.as_str()),
    )
    .with_retry_policy(RetryPolicy::with_max_retries(config.max_retries.value));

    let mut session = SessionContext::new();
    assess_image(&pipeline, &mut session, &args.image, output).await?;

    if args.chat {
        if output.is_json() {
            output.warning("--chat is ignored together with --json");
        } else {
            interactive::chat_loop(&pipeline, &mut session, output).await?;
        }
    }

    Ok(())
}

/// Run one generation attempt for `path` and render the report
pub async fn assess_image<V, C>(
    pipeline: &ValuationPipeline<V, C>,
    session: &mut SessionContext,
    path: &Path,
    output: &OutputWriter,
) -> Result<()>
where
    V: VisionModel,
    C: ChatModel,
{
    if !path.is_file() {
        return Err(errors::image_not_found(path).into());
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let spinner = create_spinner("AI 正在进行 GEP 核算...", !output.is_json());
    match pipeline.generate_report(session, &bytes).await {
        Ok(report) => {
            finish_success(&spinner, "核算完成");
            render_report(report, output)
        }
        Err(e) => {
            finish_error(&spinner, e.user_message());
            Err(errors::pipeline_failed(&e).into())
        }
    }
}

fn render_report(report: &ValuationReport, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        return output.result(AssessOutput::from(report));
    }

    let headline = report.headline();
    output.section("GEP 评估报告");
    output.kv("生态系统", &headline.ecosystem_name);
    output.kv("健康指数", format!("{}/100", headline.health_score));
    output.kv("年固碳量", format!("{:.1} 吨/年", headline.carbon));
    output.kv("生态总价值", style(&headline.total_value).green().bold());

    if !report.visual_evidence.is_empty() {
        output.section("视觉证据");
        for evidence in &report.visual_evidence {
            output.text(format!("  • {}", evidence));
        }
    }

    let calc = &report.calculation_process;
    output.section("核算过程");
    output.kv("公式", &calc.formula);
    output.kv("S 面积", &calc.param_explanation.area);
    output.kv("E 当量", &calc.param_explanation.coefficient);
    output.kv("K 修正", &calc.param_explanation.correction);
    if !calc.math_detail.is_empty() {
        output.text(&calc.math_detail);
    }

    output.section("服务价值构成");
    output.table(
        report
            .breakdown
            .iter()
            .map(|(service, value)| BreakdownRow {
                service: service.clone(),
                value: format_money(value),
            })
            .collect(),
    );

    let sim = &report.simulation;
    output.section("情景模拟");
    output.kv("情景", &sim.scenario);
    output.kv("潜在损失", style(report.loss_display()).red().bold());
    output.text(&sim.chain_of_consequence);

    if !report.suggestions.is_empty() {
        output.section("保护建议");
        for suggestion in &report.suggestions {
            output.kv(&suggestion.title, &suggestion.content);
        }
    }

    Ok(())
}
