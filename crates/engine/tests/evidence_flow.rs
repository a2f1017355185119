mod support;

use advisor_engine::{EngineConfig, EvidencePayload, ProfiledUnit, RuleInfo, RuleOutcome, RuleSet};
use advisor_metrics::InMemoryCatalog;
use advisor_protocol::{MemorySink, Severity, SpeedupKind};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use support::{
    catalog, fn_rule, fp_instructions, high_pipe_utilization, init_logging, speed_of_light,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn child_reads_parent_evidence_unchanged() {
    init_logging();
    let seen: Arc<Mutex<Option<EvidencePayload>>> = Arc::new(Mutex::new(None));
    let seen_by_child = Arc::clone(&seen);

    let rules = vec![
        fn_rule(
            RuleInfo::new("Consumer").parent("Producer"),
            Vec::new(),
            move |ctx, _| {
                *seen_by_child.lock().unwrap() = Some(ctx.receive_from_parent("Producer"));
                Ok(())
            },
        ),
        fn_rule(RuleInfo::new("Producer"), Vec::new(), |ctx, _| {
            ctx.send_to_children([("w", 0.42)].into_iter().collect::<EvidencePayload>());
            Ok(())
        }),
    ];

    let set = RuleSet::with_defaults(rules).unwrap();
    assert_eq!(set.order().collect::<Vec<_>>(), vec!["Producer", "Consumer"]);

    let unit = ProfiledUnit::new("kernel-0", InMemoryCatalog::new());
    let report = set.evaluate_unit(&unit, &mut MemorySink::new()).unwrap();

    let received = seen.lock().unwrap().clone().unwrap();
    let expected: EvidencePayload = [("w", 0.42)].into_iter().collect();
    assert_eq!(received, expected);
    assert!(received.ptr_eq(&report.evidence["Producer"]));
}

#[test]
fn global_speedup_uses_parent_weight() {
    init_logging();
    let set = RuleSet::with_defaults(vec![
        fp_instructions(),
        high_pipe_utilization(),
        speed_of_light(),
    ])
    .unwrap();
    assert_eq!(
        set.order().collect::<Vec<_>>(),
        vec!["SOLBottleneck", "HighPipeUtilization", "FPInstructions"]
    );

    let unit = ProfiledUnit::new("kernel-0", catalog(35.0, 20.0));
    let mut sink = MemorySink::new();
    let report = set.evaluate_unit(&unit, &mut sink).unwrap();

    assert_eq!(report.outcome("HighPipeUtilization"), Some(&RuleOutcome::Skipped));
    let sol = sink.findings_for("SOLBottleneck").next().unwrap();
    assert_eq!(sol.severity, Severity::Optimization);

    let fp = sink.findings_for("FPInstructions").next().unwrap();
    let speedup = fp.speedup.unwrap();
    assert_eq!(speedup.kind, SpeedupKind::Global);
    assert!(close(speedup.percent, 10.0));
    assert!(close(
        report.evidence["SOLBottleneck"]
            .get("max_throughput_normalized")
            .unwrap(),
        0.35
    ));
}

#[test]
fn missing_parent_falls_back_to_local_speedup() {
    init_logging();
    let config = EngineConfig::default().disable("HighPipeUtilization");
    let set = RuleSet::new(
        vec![speed_of_light(), high_pipe_utilization(), fp_instructions()],
        config,
    )
    .unwrap();

    let unit = ProfiledUnit::new("kernel-0", catalog(80.0, 70.0));
    let mut sink = MemorySink::new();
    set.evaluate_unit(&unit, &mut sink).unwrap();

    let speedup = sink
        .findings_for("FPInstructions")
        .next()
        .unwrap()
        .speedup
        .unwrap();
    assert_eq!(speedup.kind, SpeedupKind::Local);
    assert!(close(speedup.percent, 25.0));
}

#[test]
fn republishing_overwrites_evidence() {
    init_logging();
    let rules = vec![fn_rule(RuleInfo::new("p"), Vec::new(), |ctx, _| {
        ctx.send_to_children([("w", 1.0)].into_iter().collect::<EvidencePayload>());
        ctx.send_to_children([("w", 2.0)].into_iter().collect::<EvidencePayload>());
        Ok(())
    })];
    let set = RuleSet::with_defaults(rules).unwrap();

    let report = set
        .evaluate_unit(&ProfiledUnit::new("u", InMemoryCatalog::new()), &mut MemorySink::new())
        .unwrap();

    assert_eq!(report.evidence["p"].get("w"), Some(2.0));
    assert_eq!(report.evidence["p"].len(), 1);
}

#[test]
fn silent_or_undeclared_parents_read_empty() {
    init_logging();
    let reads: Arc<Mutex<Vec<EvidencePayload>>> = Arc::default();
    let reads_by_child = Arc::clone(&reads);

    let rules = vec![
        fn_rule(RuleInfo::new("silent"), Vec::new(), |_, _| Ok(())),
        fn_rule(RuleInfo::new("loud"), Vec::new(), |ctx, _| {
            ctx.send_to_children([("w", 3.0)].into_iter().collect::<EvidencePayload>());
            Ok(())
        }),
        fn_rule(
            RuleInfo::new("child").parent("silent").parent("never-declared"),
            Vec::new(),
            move |ctx, _| {
                let mut reads = reads_by_child.lock().unwrap();
                reads.push(ctx.receive_from_parent("silent"));
                reads.push(ctx.receive_from_parent("never-declared"));
                // published, but not a declared parent of this rule
                reads.push(ctx.receive_from_parent("loud"));
                Ok(())
            },
        ),
    ];
    let set = RuleSet::with_defaults(rules).unwrap();
    assert_eq!(set.graph().dangling_parents().len(), 1);

    set.evaluate_unit(&ProfiledUnit::new("u", InMemoryCatalog::new()), &mut MemorySink::new())
        .unwrap();

    let reads = reads.lock().unwrap();
    assert_eq!(reads.len(), 3);
    assert!(reads.iter().all(EvidencePayload::is_empty));
}

#[test]
fn units_never_see_each_others_evidence() {
    init_logging();
    let set = RuleSet::with_defaults(vec![
        speed_of_light(),
        high_pipe_utilization(),
        fp_instructions(),
    ])
    .unwrap();

    let units = [
        ProfiledUnit::new("kernel-0", catalog(20.0, 10.0)),
        ProfiledUnit::new("kernel-1", catalog(90.0, 45.0)),
    ];

    let reports = std::thread::scope(|scope| {
        let handles: Vec<_> = units
            .iter()
            .map(|unit| {
                let set = &set;
                scope.spawn(move || {
                    let mut sink = MemorySink::new();
                    set.evaluate_unit(unit, &mut sink).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });

    let max_of = |i: usize| {
        reports[i].evidence["SOLBottleneck"]
            .get("max_throughput_normalized")
            .unwrap()
    };
    assert_eq!(reports[0].unit, "kernel-0");
    assert!(close(max_of(0), 0.20));
    assert_eq!(reports[1].unit, "kernel-1");
    assert!(close(max_of(1), 0.90));
}

#[test]
fn evidence_does_not_survive_the_pass() {
    init_logging();
    let set = RuleSet::with_defaults(vec![
        fn_rule(RuleInfo::new("p"), Vec::new(), |ctx, _| {
            if ctx.unit().id() == "first" {
                ctx.send_to_children([("w", 1.0)].into_iter().collect::<EvidencePayload>());
            }
            Ok(())
        }),
        fn_rule(RuleInfo::new("c").parent("p"), Vec::new(), |ctx, _| {
            let w = ctx.parent_weight("p", "w");
            let finding = ctx.finding(Severity::Ok, "weight", format!("{w:?}"));
            ctx.report(finding);
            Ok(())
        }),
    ])
    .unwrap();

    let mut sink = MemorySink::new();
    set.evaluate_unit(&ProfiledUnit::new("first", InMemoryCatalog::new()), &mut sink)
        .unwrap();
    set.evaluate_unit(&ProfiledUnit::new("second", InMemoryCatalog::new()), &mut sink)
        .unwrap();

    let messages: Vec<&str> = sink
        .findings_for("c")
        .map(|f| f.message.as_str())
        .collect();
    assert_eq!(messages, vec!["Some(1.0)", "None"]);
}
