/*!

This is the long-form manual for `ballot_simulator` and `ballotsim`.

## The ballot

A ballot is made of sections. Each section has a label, an optional color and
an ordered list of rows. A row may hold a named candidate (with an optional
party symbol), be left empty, or be the "none of the above" (NOTA) row. The
NOTA row shows neither a row number nor a symbol.

Exactly one vote is cast in each section. Empty rows can receive a vote too: on
a paper-like ballot the button is there even if nobody is printed next to it.

## Timing

Two things happen after a delay:
* the lamp of a row flashes for `animationMs` (2000 by default) after a vote;
* the completion dialog shows up `completionDelayMs` (500 by default) after the
  last section received its vote.

Both delays must be positive: a layout with `0` for either is rejected.

Resetting the ballot clears the votes, the lamps and the dialog. Delays that
were started before the reset are ignored when they expire.

## Configuration

`ballotsim` reads the layout of the ballot from a JSON file given with
`--config`. Without it, the built-in KDMC Ward No.16 ballot is used.

```text
{
  "title": "My election",
  "abstainMarker": "NOTA",
  "timings": { "animationMs": 2000, "completionDelayMs": 500 },
  "strings": { "voteButton": "Vote", "resetButton": "Reset" },
  "sections": [
    { "id": 1, "label": "Mayor:", "color": "white",
      "candidates": [
        { "id": 1, "name": "Alice", "symbol": "rose.png" },
        { "id": 2, "name": "" },
        { "id": 3, "name": "NOTA" }
      ] }
  ]
}
```

Only `sections` is mandatory. A row is the NOTA row if `abstain` is set to
`true`, or if `abstain` is absent and its name contains `abstainMarker`.

Other optional keys: `subtitle`, `totalVotesBanner`, `instructions` (a list of
lines), `footer`, and in `strings`: `dialogTitle`, `dialogMessage`,
`dialogDetail`.

## Commands

```text
vote <section> <candidate>   cast the vote of a section
reset                        clear all the votes
wait <ms>                    let time pass
show                         draw the ballot
status                       print the status of each section
help                         print this message
quit                         leave the simulator
```

A vote in a section that already has one, or for a row that does not exist,
has no effect (it is reported in the logs with `--verbose`).

Without `--script`, the commands are read from the terminal and time follows
the wall clock: the ballot is redrawn as soon as a lamp goes off or the
completion dialog shows up, without waiting for the next command.

With `--script`, the commands are read from a file and `wait` moves a virtual
clock forward without sleeping. The final state can be written with `--out`
and checked against a reference with `--reference`:

```bash
ballotsim --script tests/full_ballot/full_ballot_script.txt \
  --reference tests/full_ballot/full_ballot_expected_summary.json --quiet
```

 */
