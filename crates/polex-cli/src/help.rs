//! Text for `exceptions examples`.

pub const EXAMPLES: &str = "\
Submit a quota exception for a year, with the request form attached:
    exceptions submit --username ccspapp --service myriad --type quota \\
        --detail \"5TB Scratch\" --form request.pdf -c \"approved by panel\"

Move it through its life:
    exceptions approve 12
    exceptions implemented 12
    exceptions remove 12

Put a rejected exception back up for decision:
    exceptions undecide 12 --force

See what needs doing, for one service:
    exceptions list todo --service legion

Monthly report, as it would have looked on a given day:
    exceptions --as-of 2026-10-01 report

Everything about one exception:
    exceptions details 12

Check the cached statuses against the status change history:
    exceptions verify

Copy the database elsewhere:
    exceptions dumpjson > exceptions.json
    exceptions --config other.conf importjson < exceptions.json

Attachments:
    exceptions form list 12
    exceptions form download 3 --dir ~/forms
";
