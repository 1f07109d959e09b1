//! Canned sample questions shown in the UI question browser.

pub const SAMPLE_QUESTIONS: &[&str] = &[
    "What is the total number of votes secured by each party in the 2019 elections?",
    "Show me the top 10 candidates with highest vote share in 2024 elections",
    "How many female candidates contested in Maharashtra assembly elections?",
    "Which constituency had the highest NOTA votes in 2019?",
    "Compare the vote share of major parties between 2019 and 2024 elections",
    "List all candidates who won with more than 50% vote share in 2024",
    "What is the average age of winning candidates in Maharashtra assembly elections?",
    "Show the party-wise distribution of SC/ST candidates in Maharashtra",
    "Which constituencies had the closest margins in 2024 elections?",
    "How many candidates contested from multiple parties between 2019 and 2024?",
    "What is the state-wise distribution of female candidates?",
    "Show constituencies where NOTA votes exceeded the margin of victory",
    "List candidates who improved their vote share from 2019 to 2024",
    "What is the age distribution of candidates by party in Maharashtra?",
    "Which party had the highest success rate in converting votes to seats?",
    "Compare postal votes vs EVM votes across constituencies in 2024",
    "Show the top 5 states with highest voter turnout",
    "List constituencies where independent candidates secured more than 20% votes",
    "What is the average margin of victory by state in 2024?",
    "Show the party-wise distribution of young candidates (under 40)",
    "Which constituencies had more than 5 candidates securing over 10% votes?",
    "Compare performance of national vs regional parties in 2024",
    "List candidates who won despite being the youngest in their constituency",
    "Show constituencies where winner changed between 2019 and 2024",
    "What is the correlation between candidate age and vote share?",
];
