use crate::dashboard::{INSTRUCTIONS, TITLE};
use crate::data_structures::{Days, TickerRegistry, MAX_DAYS, MIN_DAYS, PRICE_CEILING, PRICE_FLOOR};

const TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
<style>
body { font-family: sans-serif; display: flex; margin: 0; }
aside { width: 18rem; padding: 1rem; background: #f4f5f7; min-height: 100vh; }
main { flex: 1; padding: 1rem 2rem; }
#chart { width: 100%; }
.error { color: #b00020; }
table { border-collapse: collapse; font-size: 0.85rem; }
td, th { border: 1px solid #ddd; padding: 0.2rem 0.4rem; text-align: right; }
</style>
</head>
<body>
<aside>
<h2>{{title}}</h2>
<p>{{instructions}}</p>
<label>Days <output id="days-out">{{days}}</output>
<input id="days" type="range" min="{{min_days}}" max="{{max_days}}" value="{{days}}"></label>
<p>Price range</p>
<input id="min" type="number" min="{{floor}}" max="{{ceiling}}" step="any" value="{{floor}}">
<input id="max" type="number" min="{{floor}}" max="{{ceiling}}" step="any" value="{{ceiling}}">
<p>Companies</p>
<select id="companies" multiple size="8">{{options}}</select>
</aside>
<main>
<h3 id="heading"></h3>
<div id="status"></div>
<div id="table"></div>
<div id="chart"></div>
</main>
<script>
const ids = ["days", "min", "max", "companies"];
async function refresh() {
  const params = new URLSearchParams();
  params.set("days", document.getElementById("days").value);
  params.set("min", document.getElementById("min").value);
  params.set("max", document.getElementById("max").value);
  const chosen = [...document.getElementById("companies").selectedOptions].map(o => o.value);
  if (chosen.length === 0) params.append("companies", "");
  chosen.forEach(c => params.append("companies", c));
  document.getElementById("days-out").textContent = params.get("days");

  const res = await fetch("/api/dashboard?" + params.toString());
  const body = await res.json();
  const status = document.getElementById("status");
  if (!res.ok) {
    status.className = "error";
    status.textContent = body.message;
    document.getElementById("table").innerHTML = "";
    document.getElementById("chart").innerHTML = "";
    return;
  }
  status.className = "";
  status.textContent = "";
  document.getElementById("heading").textContent = body.heading;
  const table = document.createElement("table");
  const addRow = (label, cells, tag) => {
    const tr = table.insertRow();
    const th = document.createElement("th");
    th.textContent = label;
    tr.appendChild(th);
    cells.forEach(text => {
      const cell = document.createElement(tag);
      cell.textContent = text;
      tr.appendChild(cell);
    });
  };
  addRow("Name", body.table.dates, "th");
  body.table.rows.forEach(r => addRow(r.name, r.prices.map(p => p === null ? "" : p.toFixed(2)), "td"));
  document.getElementById("table").replaceChildren(table);
  vegaEmbed("#chart", body.chart, { actions: false });
}
ids.forEach(id => document.getElementById(id).addEventListener("change", refresh));
refresh();
</script>
</body>
</html>
"##;

/// Renders the single dashboard page. Selection state lives in the browser;
/// every control change calls `/api/dashboard`.
pub fn render(registry: &TickerRegistry, days: Days, selected: &[String]) -> String {
    let options: String = registry
        .iter()
        .map(|c| {
            let mark = if selected.contains(&c.name) { " selected" } else { "" };
            format!(
                r#"<option value="{name}"{mark}>{name} ({ticker})</option>"#,
                name = escape(&c.name),
                ticker = escape(&c.ticker)
            )
        })
        .collect();

    TEMPLATE
        .replace("{{title}}", TITLE)
        .replace("{{instructions}}", INSTRUCTIONS)
        .replace("{{days}}", &days.get().to_string())
        .replace("{{min_days}}", &MIN_DAYS.to_string())
        .replace("{{max_days}}", &MAX_DAYS.to_string())
        .replace("{{floor}}", &PRICE_FLOOR.to_string())
        .replace("{{ceiling}}", &PRICE_CEILING.to_string())
        .replace("{{options}}", &options)
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
