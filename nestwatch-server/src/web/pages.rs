//! HTML page handler — serves the violation dashboard.
//!
//! A single self-contained document (CSS + JS inline) that polls the
//! report API and renders the offending-pilot table client-side.

use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>nestwatch &mdash; no-fly-zone violations</title>
<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Courier New', monospace; background: #0a0a0a; color: #e0e0e0; }
header { background: #111; border-bottom: 1px solid #333; padding: 12px 16px; }
header .brand { color: #00ff88; font-weight: bold; font-size: 16px; }
header .sub { color: #888; font-size: 12px; margin-top: 4px; }
.container { padding: 16px; }
table { width: 100%; border-collapse: collapse; font-size: 13px; }
th { background: #1a1a1a; color: #00ff88; padding: 8px; text-align: left; border-bottom: 1px solid #333; }
td { padding: 6px 8px; border-bottom: 1px solid #1a1a1a; }
tr:hover { background: #111; }
.close { color: #ff4444; font-weight: bold; }
.empty { color: #888; padding: 24px; text-align: center; }
</style>
</head>
<body>
<header>
    <div class="brand">nestwatch</div>
    <div class="sub">pilots seen inside the no-fly zone in the last 10 minutes</div>
</header>
<div class="container">
    <table>
        <thead>
            <tr><th>Pilot</th><th>Email</th><th>Phone</th><th>Drones</th><th>Closest to nest (m)</th><th>Last seen</th></tr>
        </thead>
        <tbody id="pilots"></tbody>
    </table>
    <div class="empty" id="empty" hidden>No violations in the last 10 minutes.</div>
</div>
<script>
async function refresh() {
    try {
        const res = await fetch('/api/violations');
        const pilots = await res.json();
        const tbody = document.getElementById('pilots');
        document.getElementById('empty').hidden = pilots.length > 0;
        tbody.innerHTML = pilots.map(p => {
            const metres = (p.minDistanceToNest / 1000).toFixed(1);
            const cls = p.minDistanceToNest < 50000 ? 'close' : '';
            const seen = new Date(p.timestamp).toLocaleTimeString();
            return `<tr><td>${p.name}</td><td>${p.email}</td><td>${p.phoneNumber}</td>` +
                `<td>${p.drones.join(', ')}</td><td class="${cls}">${metres}</td><td>${seen}</td></tr>`;
        }).join('');
    } catch (e) { /* keep last table on transient errors */ }
}
refresh();
setInterval(refresh, 2000);
</script>
</body>
</html>"#;

pub async fn page_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
