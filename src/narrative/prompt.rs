//! Prompt construction for anomaly explanations and facility reports.

use super::Prompt;
use crate::monitor::MachineData;
use crate::registry::{Machine, Metric};

const ANOMALY_SYSTEM: &str = "You are an expert industrial maintenance engineer. \
Provide clear, structured analysis using the exact format requested.";

const REPORT_SYSTEM: &str = "You are an industrial operations analyst. \
Summarize facility health for a plant manager using the exact format requested.";

/// Decimal places used when quoting a metric's current value.
fn precision(metric: Metric) -> usize {
    match metric {
        Metric::Temperature | Metric::PowerConsumption => 1,
        Metric::Vibration => 2,
        Metric::Pressure | Metric::Rpm => 0,
    }
}

fn reading_line(machine: &Machine, data: &MachineData, metric: Metric) -> String {
    let range = machine.normal_ranges.get(metric);
    format!(
        "- {}: {:.prec$} {} (normal: {})",
        metric.title(),
        data.values.get(metric),
        metric.unit(),
        range,
        prec = precision(metric)
    )
}

pub fn anomaly_prompt(machine: &Machine, data: &MachineData, score: f64) -> Prompt {
    let readings: Vec<String> = Metric::ALL
        .iter()
        .map(|&m| reading_line(machine, data, m))
        .collect();

    let user = format!(
        "Analyze this industrial machine anomaly and provide a structured response:\n\n\
         Machine: {} ({})\n\
         Current readings:\n{}\n\n\
         Anomaly Score: {:.2}/1.0\n\n\
         Please provide your analysis in this format:\n\n\
         **Issue**: [Brief description of the problem]\n\n\
         **Cause**: [Most likely cause of the anomaly]\n\n\
         **Risk**: [Potential consequences if not addressed]\n\n\
         **Action**: [Immediate recommended actions]\n\n\
         Keep each section to 1-2 sentences maximum.",
        machine.name,
        machine.machine_type,
        readings.join("\n"),
        score
    );

    Prompt {
        system: ANOMALY_SYSTEM.to_string(),
        user,
    }
}

pub fn performance_prompt(readings: &[(Machine, MachineData)]) -> Prompt {
    let machines: Vec<String> = readings
        .iter()
        .map(|(machine, data)| {
            let values: Vec<String> = Metric::ALL
                .iter()
                .map(|&m| format!("{} {:.2}", m.key(), data.values.get(m)))
                .collect();
            format!(
                "- {} ({}): status {}, anomaly score {}, {}",
                machine.name,
                machine.machine_type,
                data.status,
                data.anomaly_score
                    .map_or_else(|| "n/a".to_string(), |s| format!("{:.2}", s)),
                values.join(", ")
            )
        })
        .collect();

    let user = format!(
        "Write a facility performance report from the latest readings of {} machines:\n\n{}\n\n\
         Use this format:\n\n\
         **Summary**: [Overall facility health]\n\n\
         **Concerns**: [Machines needing attention and why]\n\n\
         **Recommendations**: [Prioritized next steps]\n\n\
         Keep each section to 2-3 sentences maximum.",
        readings.len(),
        machines.join("\n")
    );

    Prompt {
        system: REPORT_SYSTEM.to_string(),
        user,
    }
}
