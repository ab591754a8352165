/// Generic formatting code for a set of records to be presented columnar, as csv, or as json, and
/// (except for json) with or without a header and with or without named fields.
///
/// Every command that prints records has a table of formatters, one per field name, and a table of
/// aliases that expand to lists of field names.  The `--fmt` option is a comma-separated list of
/// fields, aliases, and control words; the control words select the output style.
use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

pub struct Help {
    pub fields: Vec<String>,
    pub aliases: Vec<(String, Vec<String>)>,
    pub defaults: String,
}

impl Help {
    pub fn new<FmtT>(
        formatters: &HashMap<String, FmtT>,
        aliases: &HashMap<String, Vec<String>>,
        defaults: &str,
    ) -> Help {
        Help {
            fields: formatters.keys().cloned().collect::<Vec<String>>(),
            aliases: aliases
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Vec<(String, Vec<String>)>>(),
            defaults: defaults.to_string(),
        }
    }
}

const CONTROLS: [&str; 6] = ["csv", "csvnamed", "fixed", "json", "header", "noheader"];

/// If `fmt` asks for help, print the help text produced by `f` to stdout and return true.

pub fn maybe_help<F>(fmt: &Option<String>, f: F) -> bool
where
    F: Fn() -> Help,
{
    match fmt {
        Some(s) if s.starts_with("help") => {
            let mut help = f();
            println!("Syntax:\n  --fmt=(field|alias|control),...");
            println!("\nFields:");
            help.fields.sort();
            for f in help.fields {
                println!("  {f}");
            }
            if !help.aliases.is_empty() {
                println!("\nAliases:");
                help.aliases.sort();
                for (name, mut fields) in help.aliases {
                    fields.sort();
                    println!("  {name} --> {}", fields.join(","));
                }
            }
            println!("\nDefaults:\n  {}", help.defaults);
            println!("\nControl:");
            for c in CONTROLS {
                println!("  {c}");
            }
            println!("  tag:<tagvalue>");
            true
        }
        _ => false,
    }
}

/// Return a vector of the known fields in `spec` wrt the formatters, and a HashSet of any other
/// strings found in `spec`.  If `spec` holds only control words then the fields are taken from
/// `defaults`.  It returns an error if zero output fields were selected.

pub fn parse_fields<'a, FmtT>(
    spec: &'a str,
    defaults: &'a str,
    formatters: &HashMap<String, FmtT>,
    aliases: &'a HashMap<String, Vec<String>>,
) -> Result<(Vec<&'a str>, HashSet<&'a str>)> {
    let (mut fields, others) = split_fields(spec, formatters, aliases);
    if fields.is_empty() && !others.is_empty() {
        (fields, _) = split_fields(defaults, formatters, aliases);
    }
    if fields.is_empty() {
        bail!("No output fields were selected")
    }
    Ok((fields, others))
}

fn split_fields<'a, FmtT>(
    spec: &'a str,
    formatters: &HashMap<String, FmtT>,
    aliases: &'a HashMap<String, Vec<String>>,
) -> (Vec<&'a str>, HashSet<&'a str>) {
    let mut others = HashSet::new();
    let mut fields = vec![];
    for x in spec.split(',').filter(|x| !x.is_empty()) {
        if formatters.contains_key(x) {
            fields.push(x);
        } else if let Some(expansion) = aliases.get(x) {
            for field in expansion {
                if formatters.contains_key(field) {
                    fields.push(field.as_str());
                } else {
                    others.insert(field.as_str());
                }
            }
        } else {
            others.insert(x);
        }
    }
    (fields, others)
}

#[derive(Debug, Default)]
pub struct FormatOptions {
    pub tag: Option<String>,
    pub json: bool,   // json explicitly requested
    pub csv: bool,    // csv or csvnamed explicitly requested
    pub fixed: bool,  // fixed output explicitly requested
    pub named: bool,  // csvnamed explicitly requested
    pub header: bool, // true if nothing requested b/c fixed+header is default
}

/// Decode the control words left over from `parse_fields`.  Anything that is neither a field, an
/// alias, nor a control word is an error, so that a misspelled field name is not silently dropped.

pub fn standard_options(others: &HashSet<&str>) -> Result<FormatOptions> {
    let mut tag: Option<String> = None;
    for x in others {
        if let Some(t) = x.strip_prefix("tag:") {
            tag = Some(t.to_string());
        } else if !CONTROLS.contains(x) {
            bail!("Unknown field or control word '{x}'");
        }
    }
    let csvnamed = others.contains("csvnamed");
    let csv = others.contains("csv") || csvnamed;
    let json = others.contains("json") && !csv;
    let fixed = others.contains("fixed") && !csv && !json;
    // json gets no header, even if one is requested
    let header = (!csv && !json && !others.contains("noheader"))
        || (csv && others.contains("header"));
    Ok(FormatOptions {
        tag,
        json,
        csv,
        fixed,
        named: csvnamed,
        header,
    })
}

/// The `fields` are the names of formatting functions to get from the `formatters`, these are
/// applied to each element of `data` to produce one row per element.  Set `opts.header` to print a
/// first row with field names.  Set `opts.csv` or `opts.json` to get that output instead of
/// fixed-width columns.  Set `opts.tag` to Some(s) to add a tag=s field to every row.

pub fn format_data<DataT, FmtT>(
    output: &mut dyn io::Write,
    fields: &[&str],
    formatters: &HashMap<String, FmtT>,
    opts: &FormatOptions,
    data: &[DataT],
) -> Result<()>
where
    FmtT: Fn(&DataT) -> String,
{
    let fmts = fields
        .iter()
        .map(|kwd| {
            formatters
                .get(*kwd)
                .ok_or_else(|| anyhow!("No formatter for field '{kwd}'"))
        })
        .collect::<Result<Vec<&FmtT>>>()?;

    let mut names = fields.iter().map(|s| s.to_string()).collect::<Vec<String>>();
    let mut rows = data
        .iter()
        .map(|d| fmts.iter().map(|f| f(d)).collect::<Vec<String>>())
        .collect::<Vec<Vec<String>>>();
    if let Some(ref tag) = opts.tag {
        names.push("tag".to_string());
        for row in rows.iter_mut() {
            row.push(tag.clone());
        }
    }

    if opts.csv {
        format_csv(output, &names, opts, rows)
    } else if opts.json {
        format_json(output, &names, rows)
    } else {
        format_fixed_width(output, &names, opts, rows);
        Ok(())
    }
}

fn format_fixed_width(
    output: &mut dyn io::Write,
    names: &[String],
    opts: &FormatOptions,
    rows: Vec<Vec<String>>,
) {
    // The column width is the max across all the entries in the column (including header,
    // if present).
    let mut widths = vec![0; names.len()];
    if opts.header {
        for (w, name) in widths.iter_mut().zip(names) {
            *w = name.len();
        }
    }
    for row in &rows {
        for (w, val) in widths.iter_mut().zip(row) {
            *w = usize::max(*w, val.len());
        }
    }

    let header = if opts.header { Some(names.to_vec()) } else { None };
    for row in header.iter().chain(rows.iter()) {
        let mut s = String::new();
        for (val, &w) in row.iter().zip(&widths) {
            s += format!("{val:w$}  ").as_str();
        }
        // Ignore errors here, they are common for broken pipelines
        let _ = writeln!(output, "{}", s.trim_end());
    }
}

fn format_csv(
    output: &mut dyn io::Write,
    names: &[String],
    opts: &FormatOptions,
    rows: Vec<Vec<String>>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(output);

    if opts.header {
        writer.write_record(names)?;
    }
    for row in rows {
        if opts.named {
            writer.write_record(
                names
                    .iter()
                    .zip(row)
                    .map(|(name, val)| format!("{name}={val}")),
            )?;
        } else {
            writer.write_record(&row)?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn format_json(output: &mut dyn io::Write, names: &[String], rows: Vec<Vec<String>>) -> Result<()> {
    let mut objects = vec![];
    for row in rows {
        let mut obj = json::JsonValue::new_object();
        for (name, val) in names.iter().zip(row) {
            obj[name.as_str()] = val.into();
        }
        objects.push(obj);
    }
    writeln!(output, "{}", json::stringify(objects))?;
    Ok(())
}

#[cfg(test)]
type TestDatum<'a> = &'a (u32, f64);

#[cfg(test)]
fn format_test_id(d: TestDatum) -> String {
    d.0.to_string()
}

#[cfg(test)]
fn format_test_value(d: TestDatum) -> String {
    format!("{:.2}", d.1)
}

#[cfg(test)]
fn test_formatters() -> HashMap<String, &'static dyn Fn(TestDatum) -> String> {
    let mut formatters: HashMap<String, &'static dyn Fn(TestDatum) -> String> = HashMap::new();
    formatters.insert("id".to_string(), &format_test_id);
    formatters.insert("value".to_string(), &format_test_value);
    formatters
}

#[cfg(test)]
fn format_to_string(spec: &str, data: &[(u32, f64)]) -> String {
    let formatters = test_formatters();
    let mut aliases = HashMap::new();
    aliases.insert("all".to_string(), vec!["id".to_string(), "value".to_string()]);
    let (fields, others) = parse_fields(spec, "all", &formatters, &aliases).unwrap();
    let opts = standard_options(&others).unwrap();
    let mut output = Vec::new();
    format_data(&mut output, &fields, &formatters, &opts, data).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_parse_fields() {
    let formatters = test_formatters();
    let mut aliases = HashMap::new();
    aliases.insert("all".to_string(), vec!["id".to_string(), "value".to_string()]);

    let (fields, others) = parse_fields("value,csv,id", "all", &formatters, &aliases).unwrap();
    assert!(fields == vec!["value", "id"]);
    assert!(others.len() == 1 && others.contains("csv"));

    let (fields, _) = parse_fields("all", "id", &formatters, &aliases).unwrap();
    assert!(fields == vec!["id", "value"]);

    // Only control words: the fields come from the defaults.
    let (fields, others) = parse_fields("csv,header", "all", &formatters, &aliases).unwrap();
    assert!(fields == vec!["id", "value"]);
    assert!(others.len() == 2 && others.contains("csv") && others.contains("header"));

    assert!(parse_fields("", "all", &formatters, &aliases).is_err());
}

#[test]
fn test_standard_options() {
    let opts = standard_options(&HashSet::new()).unwrap();
    assert!(!opts.csv && !opts.json && opts.header);

    let opts = standard_options(&HashSet::from(["csvnamed", "header", "tag:x"])).unwrap();
    assert!(opts.csv && opts.named && opts.header);
    assert!(opts.tag == Some("x".to_string()));

    let opts = standard_options(&HashSet::from(["json", "header"])).unwrap();
    assert!(opts.json && !opts.header);

    assert!(standard_options(&HashSet::from(["wating"])).is_err());
}

#[test]
fn test_format_data() {
    let data = [(0, 53.333), (12, 100.0)];
    assert!(format_to_string("all", &data) == "id  value\n0   53.33\n12  100.00\n");
    assert!(format_to_string("all,noheader", &data) == "0   53.33\n12  100.00\n");
    assert!(format_to_string("id,value,csv", &data) == "0,53.33\n12,100.00\n");
    assert!(format_to_string("id,csv,header", &data) == "id\n0\n12\n");
    assert!(format_to_string("id,csvnamed,tag:t", &data) == "id=0,tag=t\nid=12,tag=t\n");
    assert!(
        format_to_string("value,json", &data)
            == "[{\"value\":\"53.33\"},{\"value\":\"100.00\"}]\n"
    );
    assert!(format_to_string("all", &[]) == "id  value\n");
    assert!(format_to_string("csv", &data) == "0,53.33\n12,100.00\n");
}
