#![allow(dead_code)]

use advisor_engine::{estimate_speedup, EvidencePayload, Result, Rule, RuleContext, RuleInfo};
use advisor_metrics::{InMemoryCatalog, MetricRequest, MetricValue, ResolutionTable};
use advisor_protocol::{FocusMetric, Importance, Severity};

pub const COMPUTE_SOL: &str = "sm__throughput.avg.pct_of_peak_sustained_elapsed";
pub const MEMORY_SOL: &str = "gpu__compute_memory_throughput.avg.pct_of_peak_sustained_elapsed";
pub const FP32_PIPE: &str = "sm__inst_executed_pipe_fma.avg.pct_of_peak_sustained_active";
pub const FFMA: &str = "smsp__sass_thread_inst_executed_op_ffma_pred_on.sum";
pub const FADD: &str = "smsp__sass_thread_inst_executed_op_fadd_pred_on.sum";
pub const FMUL: &str = "smsp__sass_thread_inst_executed_op_fmul_pred_on.sum";

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

type Evaluate = dyn Fn(&mut RuleContext<'_>, &ResolutionTable) -> Result<()> + Send + Sync;

/// Rule assembled from a closure
pub struct FnRule {
    info: RuleInfo,
    requests: Vec<MetricRequest>,
    evaluate: Box<Evaluate>,
}

impl Rule for FnRule {
    fn info(&self) -> &RuleInfo {
        &self.info
    }

    fn requested_metrics(&self) -> Vec<MetricRequest> {
        self.requests.clone()
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>, metrics: &ResolutionTable) -> Result<()> {
        (self.evaluate)(ctx, metrics)
    }
}

pub fn fn_rule<F>(info: RuleInfo, requests: Vec<MetricRequest>, evaluate: F) -> Box<dyn Rule>
where
    F: Fn(&mut RuleContext<'_>, &ResolutionTable) -> Result<()> + Send + Sync + 'static,
{
    Box::new(FnRule {
        info,
        requests,
        evaluate: Box::new(evaluate),
    })
}

/// Speed-of-light summary; publishes normalized throughputs for its children.
pub fn speed_of_light() -> Box<dyn Rule> {
    fn_rule(
        RuleInfo::new("SOLBottleneck")
            .name("Bottleneck")
            .section("SpeedOfLight"),
        vec![
            MetricRequest::required(COMPUTE_SOL).alias("compute_sol"),
            MetricRequest::required(MEMORY_SOL).alias("memory_sol"),
        ],
        |ctx, metrics| {
            let compute = metrics.require("compute_sol")?.value();
            let memory = metrics.require("memory_sol")?.value();
            let max = compute.max(memory);

            let (severity, message) = if max < 60.0 {
                (
                    Severity::Optimization,
                    "This workload exhibits low compute throughput and memory bandwidth utilization",
                )
            } else {
                (Severity::Ok, "Compute and memory are well utilized")
            };
            let finding = ctx.finding(severity, "Bottleneck", message);
            ctx.report(finding);

            ctx.send_to_children(
                [
                    ("compute_throughput_normalized", compute / 100.0),
                    ("memory_throughput_normalized", memory / 100.0),
                    ("max_throughput_normalized", max / 100.0),
                ]
                .into_iter()
                .collect::<EvidencePayload>(),
            );
            Ok(())
        },
    )
}

/// Pipe utilization; publishes the FP32 pipe share used as weight downstream.
pub fn high_pipe_utilization() -> Box<dyn Rule> {
    fn_rule(
        RuleInfo::new("HighPipeUtilization")
            .section("ComputeWorkloadAnalysis")
            .parent("SOLBottleneck"),
        vec![MetricRequest::required(FP32_PIPE)],
        |ctx, metrics| {
            let fp32 = metrics.require(FP32_PIPE)?.value();
            let payload: EvidencePayload =
                [("fp32_pipeline_utilization_pct", fp32)].into_iter().collect();
            ctx.send_to_children(payload);
            Ok(())
        },
    )
}

/// Non-fused FP32 instructions; the speedup is global when the pipe share is known.
pub fn fp_instructions() -> Box<dyn Rule> {
    fn_rule(
        RuleInfo::new("FPInstructions")
            .section("InstructionStats")
            .parent("HighPipeUtilization"),
        vec![
            MetricRequest::optional(FFMA).fallback(0u64),
            MetricRequest::optional(FADD).fallback(0u64),
            MetricRequest::optional(FMUL).fallback(0u64),
        ],
        |ctx, metrics| {
            let fused = metrics.value(FFMA).unwrap_or_default();
            let non_fused = metrics.value(FADD).unwrap_or_default()
                + metrics.value(FMUL).unwrap_or_default();
            let total = fused + non_fused;
            if total <= 0.0 || non_fused == 0.0 {
                return Ok(());
            }

            // Fusing two non-fused instructions saves one
            let local_fraction = non_fused / total * 0.5;
            let weight = ctx.parent_weight("HighPipeUtilization", "fp32_pipeline_utilization_pct");
            let finding = ctx
                .finding(
                    Severity::Optimization,
                    "FP32 Non-Fused Instructions",
                    "Convert pairs of non-fused FP32 instructions to FFMA",
                )
                .with_speedup(estimate_speedup(local_fraction, weight))
                .with_focus_metric(FocusMetric::new(
                    FADD,
                    metrics.value(FADD).unwrap_or_default(),
                    Importance::High,
                    "Lower is better",
                ));
            ctx.report(finding);
            Ok(())
        },
    )
}

pub fn catalog(compute: f64, memory: f64) -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with(COMPUTE_SOL, MetricValue::Float(compute))
        .with(MEMORY_SOL, MetricValue::Float(memory))
        .with(FP32_PIPE, MetricValue::Float(40.0))
        .with(FFMA, MetricValue::UInt(400))
        .with(FADD, MetricValue::UInt(300))
        .with(FMUL, MetricValue::UInt(100))
}
