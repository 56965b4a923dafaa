use std::path::Path;

use dosimetria::{
    compute_sentence, default_keywords, extract_penalties, load_document, load_keywords, Document,
    HtmlBlocks, SentenceFactors,
};

fn main() {
    // Simple CLI flags parsing
    let args: Vec<String> = std::env::args().collect();

    fn flag_value(args: &[String], name: &str) -> Option<String> {
        let pos = args.iter().position(|a| a == name)?;
        let val = args.get(pos + 1)?;
        if val.starts_with("--") {
            None
        } else {
            Some(val.clone())
        }
    }

    fn flag_u32(args: &[String], name: &str) -> u32 {
        flag_value(args, name).and_then(|v| v.parse::<u32>().ok()).unwrap_or(0)
    }

    fn flag_f64(args: &[String], name: &str) -> f64 {
        flag_value(args, name).and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0)
    }

    let input = flag_value(&args, "--input").unwrap_or_else(|| "DEL2848compilado.html".to_string());
    let no_blocks = args.iter().any(|a| a == "--no-blocks");
    let trace_on = args.iter().any(|a| a == "--trace");
    let crime = flag_value(&args, "--crime");
    let manual_min = flag_value(&args, "--pena-minima").and_then(|v| v.parse::<u32>().ok());

    // 1) Keyword list: external YAML config, or the built-in offense list
    let keywords = match flag_value(&args, "--keywords") {
        Some(p) => match load_keywords(Path::new(&p)) {
            Ok(k) => k,
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "load_keywords",
                        "file": p,
                        "error": e.to_string(),
                        "error_code": 3
                    })
                );
                std::process::exit(3);
            }
        },
        None => default_keywords(),
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "load_keywords",
            "status": "ok",
            "count": keywords.len()
        })
    );

    // 2) Load and decode the statute document
    let text = match load_document(Path::new(&input)) {
        Ok(t) => t,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "load_document",
                    "file": input,
                    "error": e.to_string(),
                    "error_code": 1
                })
            );
            std::process::exit(1);
        }
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "load_document",
            "file": input,
            "chars": text.chars().count()
        })
    );

    // 3) Build the document snapshot; block flattening is optional
    let flattener = HtmlBlocks;
    let doc = if no_blocks {
        Document::new(&text, None)
    } else {
        Document::new(&text, Some(&flattener))
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "flatten_blocks",
            "available": doc.block_stream().is_some()
        })
    );

    // 4) Extraction per keyword
    let results = extract_penalties(&doc, &keywords);
    for r in &results {
        eprintln!(
            "{}",
            serde_json::json!({
                "tool": "extract_penalties",
                "keyword": r.keyword,
                "chosen_months": r.chosen,
                "candidates": r.candidates.len(),
                "attempts": r.trace.len()
            })
        );
        if trace_on {
            for a in &r.trace {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "trace",
                        "keyword": r.keyword,
                        "method": a.method,
                        "rule": a.rule,
                        "months": a.months,
                        "excerpt": a.excerpt
                    })
                );
            }
        }
    }

    let mut out = serde_json::json!({ "results": results });

    // 5) Optional sentencing for one selected offense
    if let Some(crime) = crime {
        let extracted = results.iter().find(|r| r.keyword == crime).and_then(|r| r.chosen);
        // A missing extracted penalty requires a manual value; it is never zero.
        let minimum = match manual_min.or(extracted) {
            Some(m) => m,
            None => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "compute_sentence",
                        "crime": crime,
                        "error": "PenaltyNotFound",
                        "guidance": "no minimum penalty extracted; pass --pena-minima <months>",
                        "error_code": 4
                    })
                );
                std::process::exit(4);
            }
        };
        let factors = SentenceFactors {
            judicial_circumstances: flag_u32(&args, "--circunstancias"),
            aggravating: flag_u32(&args, "--agravantes"),
            attenuating: flag_u32(&args, "--atenuantes"),
            increase_pct: flag_f64(&args, "--majorantes"),
            decrease_pct: flag_f64(&args, "--minorantes"),
        };
        let breakdown = compute_sentence(minimum, &factors);
        eprintln!(
            "{}",
            serde_json::json!({
                "tool": "compute_sentence",
                "crime": crime,
                "minimum_months": breakdown.minimum_months,
                "final_months": breakdown.final_months,
                "years": breakdown.years,
                "months": breakdown.months
            })
        );
        out["sentence"] = serde_json::to_value(&breakdown).unwrap_or_default();
    }

    println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
}
