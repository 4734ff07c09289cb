/*!

This is the long-form manual for `point_ranking` and the `leaderboard` program.

## Input formats

The following providers are supported:
* `excel` a spreadsheet (.xlsx), one row per line of points
* `csv` Comma Separated Values with a header row
* `json` a snapshot file, as written by the `export` command

### `excel` and `csv`

The first row is the header. The columns are found by name, and each logical
field accepts several spellings. The first spelling present in a row wins:

| field       | accepted headers            | required |
|-------------|-----------------------------|----------|
| name        | `שם`, `Name`, `name`        | yes      |
| points      | `נקודות`, `Points`, `points` | no (0)   |
| update time | `עדכון`, `Update`, `Time`    | no       |

```text
Name,Points,Update
Alice,3,Sunday 12:00
Bob,2,
Alice,5,
```

Names are trimmed. Rows without a name, or with the placeholder name
`שם לא ידוע`, are ignored. Points that are not numbers count as 0. The update
time is only read from the first data row.

Two ingestion modes are available for these providers:
* `aggregate` (default): rows with the same name are summed. The example above
  gives Alice 8 points.
* `snapshot`: every row is already a total. Rows are not summed.

### `json`

```json
{
  "manualUpdateTime": "Sunday 12:00",
  "employees": [{ "id": "emp-000001", "fullName": "Alice", "totalPoints": 8 }],
  "entries": [{ "id": "entry-000001", "employeeId": "emp-000001",
                "points": 6, "reason": "alcohol", "date": "2026-01-20T18:00:00Z" }]
}
```

The `entries` list is the history of score events, newest first. The admin
commands only work with this provider, since it is the only one that can be
written back.

## Ranking

Employees are ranked by points with standard competition ranking: employees
with the same total share a rank, and the next rank skips as many places as
there were tied employees. Points `50, 30, 30, 10` give the ranks `1, 2, 2, 4`.

## Point categories

| category  | points | reason tag |
|-----------|--------|------------|
| shift     | 1      | `shift`    |
| alcohol   | 6      | `alcohol`  |
| average   | 6      | `average`  |

The values can be changed in the `pointValues` section of the configuration.
Arbitrary amounts can also be granted with `--points` and `--reason`.

## Configuration

`leaderboard` accepts a configuration file in JSON. Only the `source` section
is required. Relative paths are resolved from the directory of the
configuration file.

```json
{
  "outputSettings": { "title": "Team Challenge", "outputPath": "board.json" },
  "source": { "provider": "excel", "filePath": "ranking.xlsx", "mode": "aggregate" },
  "competition": { "startDate": "2026-01-11T00:00:00", "deadline": "2026-02-05T23:59:59" },
  "admin": { "passcode": "1234" },
  "pointValues": { "shift": 1, "alcohol": 6, "average": 6 },
  "refreshIntervalSeconds": 300
}
```

Options of `source`:
 - `provider` (string): `excel`, `csv` or `json`.
 - `filePath` (string): the data file.
 - `mode` (string, optional): `aggregate` or `snapshot`.
 - `excelWorksheetName` (string, optional): for Excel inputs, the name of the
   worksheet. The first worksheet is used otherwise.
 - `unknownNameLabel` (string, optional): the placeholder for unknown names.

> Note: the admin passcode only prevents accidental edits. Anyone who can read
> the configuration file can read the passcode.

 */
