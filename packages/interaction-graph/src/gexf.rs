//! GEXF 1.2 output.
//!
//! Set-valued attributes are written as comma-joined strings since GEXF has
//! no list type that graph tools agree on.

use chrono::{DateTime, Utc};
use std::io::{self, Write};

use crate::graph::{EdgeKind, GraphStore};

const DELIMITER: &str = ",";

/// Write `graph` as an undirected GEXF document.
pub fn write_gexf<W: Write>(graph: &GraphStore, writer: &mut W) -> io::Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">"#)?;
    writeln!(writer, r#"  <meta><creator>interaction-crawl</creator></meta>"#)?;
    writeln!(writer, r#"  <graph mode="static" defaultedgetype="undirected">"#)?;

    writeln!(writer, r#"    <attributes class="node">"#)?;
    writeln!(writer, r#"      <attribute id="0" title="user_of" type="string"/>"#)?;
    writeln!(writer, r#"    </attributes>"#)?;
    writeln!(writer, r#"    <attributes class="edge">"#)?;
    for (id, kind) in [EdgeKind::InGroup, EdgeKind::OutGroup].iter().enumerate() {
        writeln!(
            writer,
            r#"      <attribute id="{}" title="{}" type="string"/>"#,
            id,
            kind.attribute()
        )?;
    }
    writeln!(writer, r#"    </attributes>"#)?;

    writeln!(writer, "    <nodes>")?;
    for (name, node) in graph.nodes() {
        let name = escape(name);
        writeln!(writer, r#"      <node id="{}" label="{}">"#, name, name)?;
        writeln!(writer, "        <attvalues>")?;
        writeln!(
            writer,
            r#"          <attvalue for="0" value="{}"/>"#,
            join(node.user_of.iter())
        )?;
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </node>")?;
    }
    writeln!(writer, "    </nodes>")?;

    writeln!(writer, "    <edges>")?;
    for (id, (key, edge)) in graph.edges().enumerate() {
        let (source, target) = key.endpoints();
        writeln!(
            writer,
            r#"      <edge id="{}" source="{}" target="{}">"#,
            id,
            escape(source),
            escape(target)
        )?;
        writeln!(writer, "        <attvalues>")?;
        for (attr, kind) in [EdgeKind::InGroup, EdgeKind::OutGroup].iter().enumerate() {
            let submissions = edge.submissions(*kind);
            if submissions.is_empty() {
                continue;
            }
            writeln!(
                writer,
                r#"          <attvalue for="{}" value="{}"/>"#,
                attr,
                join(submissions.iter())
            )?;
        }
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </edge>")?;
    }
    writeln!(writer, "    </edges>")?;

    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</gexf>")?;
    Ok(())
}

/// `{a}_{b}_limit-{N|None}_{YYYYmmdd-HHMMSS}.gexf`
pub fn output_filename(first: &str, second: &str, limit: Option<usize>, at: DateTime<Utc>) -> String {
    let limit = limit.map_or_else(|| "None".to_string(), |n| n.to_string());
    format!("{}_{}_limit-{}_{}.gexf", first, second, limit, at.format("%Y%m%d-%H%M%S"))
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    escape(&values.map(String::as_str).collect::<Vec<_>>().join(DELIMITER))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
