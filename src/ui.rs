use crate::models::{TodayResponse, UserStats};

pub fn render_index(today: &TodayResponse, stats: &UserStats) -> String {
    INDEX_HTML
        .replace("{{DATE}}", &today.date.format("%A, %B %-d, %Y").to_string())
        .replace("{{PROGRESS}}", &today.progress_percent.to_string())
        .replace("{{STREAK}}", &stats.streak.to_string())
        .replace("{{BADGES}}", &stats.badges.len().to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily Goals</title>
  <style>
    :root {
      --bg: #f4f5fb;
      --surface: #ffffff;
      --ink: #1f2333;
      --muted: #6b7085;
      --primary: #6366f1;
      --secondary: #0ea5e9;
      --done: #16a34a;
      --not-done: #dc2626;
      --progress: #ca8a04;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    main {
      max-width: 1080px;
      margin: 0 auto;
      padding: 24px 16px 96px;
      display: grid;
      grid-template-columns: 2fr 1fr;
      gap: 20px;
    }

    .card {
      background: var(--surface);
      border-radius: 14px;
      padding: 20px;
      box-shadow: 0 6px 20px rgba(31, 35, 51, 0.08);
    }

    .wide { grid-column: 1 / -1; }
    h1, h2, h3 { margin: 0 0 12px; }
    .muted { color: var(--muted); }

    .goal {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
      padding: 12px;
      border-radius: 10px;
      margin-bottom: 10px;
      border-left: 4px solid var(--progress);
      background: #fefce8;
    }

    .goal[data-status="Done"] { border-color: var(--done); background: #f0fdf4; }
    .goal[data-status="Not Done"] { border-color: var(--not-done); background: #fef2f2; }

    button {
      border: none;
      border-radius: 8px;
      padding: 8px 12px;
      cursor: pointer;
      font-weight: 600;
      background: var(--primary);
      color: white;
    }

    button.ghost { background: #e5e7eb; color: var(--ink); }
    button:disabled { background: #9ca3af; cursor: not-allowed; }

    form.inline { display: grid; grid-template-columns: 2fr 1fr 1fr 1fr auto; gap: 8px; margin-top: 12px; }
    input, select { padding: 8px; border: 1px solid #d1d5db; border-radius: 8px; }

    .bar { height: 12px; background: #e5e7eb; border-radius: 999px; overflow: hidden; }
    .bar > div { height: 100%; background: linear-gradient(90deg, var(--primary), var(--secondary)); }

    .week { display: grid; grid-template-columns: repeat(7, 1fr); gap: 10px; align-items: end; height: 180px; }
    .week .col { display: flex; flex-direction: column; justify-content: flex-end; align-items: center; height: 100%; gap: 6px; }
    .week .fill { width: 70%; background: var(--primary); border-radius: 6px 6px 0 0; }

    #reminder {
      position: fixed; left: 50%; bottom: 24px; transform: translateX(-50%);
      background: var(--secondary); color: white; padding: 14px 18px; border-radius: 12px;
      display: none; gap: 12px; align-items: center;
    }

    #chat-log { height: 220px; overflow-y: auto; display: flex; flex-direction: column; gap: 8px; margin-bottom: 10px; }
    .bubble { padding: 8px 12px; border-radius: 10px; max-width: 80%; }
    .bubble.user { align-self: flex-end; background: var(--primary); color: white; }
    .bubble.model { align-self: flex-start; background: #e5e7eb; }

    @media (max-width: 800px) {
      main { grid-template-columns: 1fr; }
      form.inline { grid-template-columns: 1fr; }
    }
  </style>
</head>
<body>
  <main>
    <section class="card">
      <h1>Today's Goals</h1>
      <p class="muted">{{DATE}}</p>
      <div id="goals"></div>
      <form class="inline" id="add-form">
        <input id="title" placeholder="e.g., Finish the ownership chapter" required />
        <select id="category">
          <option>Learning</option>
          <option>Exercise</option>
          <option>Team Work</option>
          <option>Personal Growth</option>
        </select>
        <input id="start" type="time" value="09:00" />
        <input id="end" type="time" value="10:00" />
        <button type="submit">Add Goal</button>
      </form>
      <p><button id="reflect-btn" disabled title="Mark at least one goal as 'Not Done' to reflect">Reflect</button></p>
    </section>

    <aside>
      <section class="card">
        <h3>Daily Progress <span id="progress-label">{{PROGRESS}}%</span></h3>
        <div class="bar"><div id="progress-bar" style="width: {{PROGRESS}}%"></div></div>
      </section>
      <section class="card" style="margin-top: 20px">
        <h3>Achievements</h3>
        <p><strong id="streak">{{STREAK}}</strong> day streak</p>
        <p class="muted" id="badges">{{BADGES}} badge(s) earned</p>
      </section>
    </aside>

    <section class="card wide">
      <h2>Weekly Achievement Report</h2>
      <div class="week" id="week"></div>
    </section>

    <section class="card wide" id="reflection" hidden>
      <h2>End of Day Reflection</h2>
      <div id="reflection-body"></div>
      <p>
        <button id="reflection-submit" disabled>Get AI Feedback</button>
        <button class="ghost" id="reflection-close">Close</button>
      </p>
    </section>

    <section class="card wide">
      <h2>AI Assistant</h2>
      <div id="chat-log"><p class="muted">Ask a question to start.</p></div>
      <form class="inline" id="chat-form" style="grid-template-columns: 1fr auto">
        <input id="chat-input" placeholder="e.g., How do I stay consistent with exercise?" />
        <button type="submit">Send</button>
      </form>
    </section>
  </main>

  <div id="reminder">
    <span>It's after 8 PM! Time for your daily reflection.</span>
    <button class="ghost" id="reminder-open">Reflect</button>
    <button class="ghost" id="reminder-dismiss">&times;</button>
  </div>

  <script>
    const $ = (id) => document.getElementById(id);
    const REASONS = ['Time', 'Difficulty', 'Distraction', 'Other'];
    const NEXT = {
      'In Progress': ['Done', 'Not Done'],
      'Not Done': ['In Progress', 'Done'],
      'Done': []
    };

    const api = async (path, options = {}) => {
      const res = await fetch(path, {
        headers: { 'content-type': 'application/json' },
        ...options
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.status === 204 ? null : res.json();
    };

    const el = (tag, text, className) => {
      const node = document.createElement(tag);
      if (text !== undefined) node.textContent = text;
      if (className) node.className = className;
      return node;
    };

    const renderGoals = (today) => {
      const list = $('goals');
      list.replaceChildren();
      if (!today.goals.length) {
        list.append(el('p', 'No goals yet. Add one to get started.', 'muted'));
      }
      today.goals.forEach((goal) => {
        const row = el('div', undefined, 'goal');
        row.dataset.status = goal.status;
        const info = el('div');
        info.append(el('strong', goal.title), el('div', `${goal.category} · ${goal.start_time} - ${goal.end_time}`, 'muted'));
        const actions = el('div');
        NEXT[goal.status].forEach((status) => {
          const btn = el('button', status, 'ghost');
          btn.onclick = () => act(() => api(`/api/goals/${goal.id}/status`, { method: 'POST', body: JSON.stringify({ status }) }));
          actions.append(btn);
        });
        const del = el('button', 'Delete', 'ghost');
        del.onclick = () => act(() => api(`/api/goals/${goal.id}`, { method: 'DELETE' }));
        actions.append(del);
        row.append(info, actions);
        list.append(row);
      });
      $('progress-label').textContent = `${today.progress_percent}%`;
      $('progress-bar').style.width = `${today.progress_percent}%`;
      $('reflect-btn').disabled = !today.reflect_enabled;
    };

    const renderStats = (stats) => {
      $('streak').textContent = stats.streak;
      $('badges').textContent = stats.badges.length ? stats.badges.join(' · ') : 'No badges earned yet. Keep going!';
    };

    const renderWeek = (report) => {
      const week = $('week');
      week.replaceChildren();
      report.days.forEach((day) => {
        const col = el('div', undefined, 'col');
        const fill = el('div', undefined, 'fill');
        fill.style.height = `${Math.max(day.percentage, 2)}%`;
        fill.title = `${day.percentage.toFixed(0)}%`;
        col.append(el('span', `${day.percentage.toFixed(0)}%`, 'muted'), fill, el('span', day.name));
        week.append(col);
      });
    };

    const refresh = async () => {
      const [today, stats, report, reminder] = await Promise.all([
        api('/api/today'), api('/api/stats'), api('/api/report/weekly'), api('/api/reminder')
      ]);
      renderGoals(today);
      renderStats(stats);
      renderWeek(report);
      $('reminder').style.display = reminder.visible ? 'flex' : 'none';
    };

    const act = (fn) => fn().then(refresh).catch((err) => alert(err.message));

    $('add-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const body = {
        title: $('title').value,
        category: $('category').value,
        start_time: $('start').value,
        end_time: $('end').value
      };
      act(() => api('/api/goals', { method: 'POST', body: JSON.stringify(body) }).then(() => { $('title').value = ''; }));
    });

    const reasons = {};

    const openReflection = async () => {
      const { incomplete_goals } = await api('/api/reflection/open', { method: 'POST' });
      Object.keys(reasons).forEach((key) => delete reasons[key]);
      const body = $('reflection-body');
      body.replaceChildren(el('p', "Let's reflect on the goals you couldn't complete. Why do you think that was?", 'muted'));
      incomplete_goals.forEach((goal) => {
        const select = el('select');
        select.append(el('option', 'Select a reason'));
        select.firstChild.value = '';
        REASONS.forEach((reason) => select.append(el('option', reason)));
        select.onchange = () => {
          reasons[goal.id] = select.value;
          $('reflection-submit').disabled = incomplete_goals.some((g) => !reasons[g.id]);
        };
        body.append(el('p', goal.title), select);
      });
      $('reflection-submit').disabled = true;
      $('reflection').hidden = false;
      $('reminder').style.display = 'none';
    };

    const link = (item) => {
      const a = el('a', item.title);
      a.href = item.url;
      a.target = '_blank';
      a.rel = 'noopener noreferrer';
      const li = el('li');
      li.append(a);
      return li;
    };

    $('reflection-submit').onclick = async () => {
      const body = $('reflection-body');
      $('reflection-submit').disabled = true;
      try {
        const reflection = await api('/api/reflection', { method: 'POST', body: JSON.stringify({ reasons }) });
        const videos = el('ul');
        reflection.youtubeLinks.forEach((item) => videos.append(link(item)));
        const articles = el('ul');
        reflection.articleLinks.forEach((item) => articles.append(link(item)));
        body.replaceChildren(
          el('h3', 'Motivational Tip'), el('p', reflection.motivationalTip),
          el('h3', 'Recommended Videos'), videos,
          el('h3', 'Suggested Articles'), articles
        );
      } catch (err) {
        alert(err.message);
        $('reflection-submit').disabled = false;
      }
    };

    $('reflection-close').onclick = () => act(async () => {
      await api('/api/reflection/close', { method: 'POST' });
      $('reflection').hidden = true;
    });

    $('reflect-btn').onclick = () => openReflection().catch((err) => alert(err.message));
    $('reminder-open').onclick = () => openReflection().catch((err) => alert(err.message));
    $('reminder-dismiss').onclick = () => act(() => api('/api/reminder/dismiss', { method: 'POST' }));

    const renderChat = (history) => {
      const log = $('chat-log');
      log.replaceChildren();
      history.forEach((turn) => log.append(el('div', turn.text, `bubble ${turn.role}`)));
      log.scrollTop = log.scrollHeight;
    };

    $('chat-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const input = $('chat-input');
      const query = input.value;
      if (!query.trim()) return;
      input.disabled = true;
      try {
        const response = await api('/api/chat', { method: 'POST', body: JSON.stringify({ query }) });
        renderChat(response.history);
        input.value = '';
      } catch (err) {
        alert(err.message);
      } finally {
        input.disabled = false;
      }
    });

    api('/api/chat').then((history) => history.length && renderChat(history)).catch(() => {});
    refresh().catch((err) => alert(err.message));
    setInterval(() => api('/api/reminder').then((r) => {
      $('reminder').style.display = r.visible ? 'flex' : 'none';
    }).catch(() => {}), 60 * 1000);
  </script>
</body>
</html>
"#;
